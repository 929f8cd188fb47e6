#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use urlindex::index::{Row, Store};
use urlindex::query::{QueryExecutor, SearchTermCache, parse_query};

#[derive(Arbitrary, Debug)]
struct Input {
    rows: Vec<(u16, String, String)>,
    deletes: Vec<u16>,
    queries: Vec<String>,
}

fuzz_target!(|input: Input| {
    let mut store = Store::new();
    for (id, url, title) in input.rows.iter().take(64) {
        store.upsert(u32::from(*id), Row::new(url.as_str(), title.as_str()));
    }
    for id in &input.deletes {
        store.delete(u32::from(*id));
    }
    assert!(store.validate().is_ok());

    let config = urlindex::index::IndexConfig::default();
    let mut cache = SearchTermCache::new();
    for text in input.queries.iter().take(8) {
        let outcome = QueryExecutor::new(&store, &mut cache, &config).execute(&parse_query(text));
        assert!(outcome.matches.len() <= config.max_matches);
    }
});
