//! End-to-end behavior of the history index over a small browsing history.

mod fixtures;

use fixtures::{ids, now_secs, ready_index, ready_index_with, source};
use std::path::Path;
use urlindex::engine::HistoryIndex;
use urlindex::index::{IndexConfig, IndexState, Row, ScoredMatch, SearchCounts, Store};
use urlindex::query::{QueryExecutor, Scorer, ScoringWeights, SearchTermCache, parse_query};
use urlindex::utils::is_allowed_scheme;

#[test]
fn test_retrieval() {
    let mut index = ready_index();

    let matches = index.search("DrudgeReport");
    assert_eq!(ids(&matches), vec![5]);
    assert_eq!(matches[0].row.url, "http://drudgereport.com/");
    assert_eq!(matches[0].row.title, "DRUDGE REPORT 2010");
    assert!(matches[0].can_inline);

    // Trailing whitespace means the user is done with the term
    let matches = index.search("DrudgeReport ");
    assert_eq!(ids(&matches), vec![5]);
    assert!(!matches[0].can_inline);

    let matches = index.search("drudge");
    assert_eq!(matches.len(), 2);
    assert!(matches[0].raw_score >= matches[1].raw_score);

    let matches = index.search("https NearlyPerfectResult");
    assert_eq!(ids(&matches), vec![9]);
    assert!(matches[0].raw_score > 900.0, "score {}", matches[0].raw_score);
    assert!(!matches[0].can_inline);

    let matches = index.search("z y x");
    assert_eq!(ids(&matches), vec![10]);
    assert!(matches[0].raw_score < 500.0, "score {}", matches[0].raw_score);
    assert!(!matches[0].can_inline);

    // Title-only match
    let matches = index.search("Mice");
    assert_eq!(ids(&matches), vec![13]);
    assert!(matches[0].url_matches.is_empty());
    assert!(!matches[0].can_inline);

    let matches = index.search("fubar");
    assert_eq!(ids(&matches), vec![11]);
    assert!(matches[0].can_inline);
}

#[test]
fn test_url_prefix_matching() {
    let mut index = ready_index();

    // Both hosts start with the term; the popular one ranks first
    let matches = index.search("drudgere");
    assert_eq!(ids(&matches), vec![5, 6]);
    assert!(matches.iter().all(|m| m.can_inline));
    assert_eq!(matches[1].url_matches[0].offset, "http://www.".len());

    let matches = index.search("drudgerep");
    assert_eq!(ids(&matches), vec![5]);
    assert!(matches[0].can_inline);

    let matches = index.search("http://drudgere");
    assert_eq!(ids(&matches), vec![5]);
    assert!(matches[0].can_inline);

    assert!(index.search("www.atdmt").is_empty());

    let matches = index.search("atdmt");
    assert_eq!(ids(&matches), vec![7]);
    assert!(!matches[0].can_inline);

    let matches = index.search("view.atdmt");
    assert_eq!(ids(&matches), vec![7]);
    assert!(matches[0].can_inline);

    let matches = index.search("http://view.atdmt");
    assert_eq!(ids(&matches), vec![7]);
    assert!(matches[0].can_inline);

    let matches = index.search("cnn.com");
    assert_eq!(matches.len(), 2);
    assert_ne!(matches[0].can_inline, matches[1].can_inline);

    let matches = index.search("www.cnn.com");
    assert_eq!(ids(&matches), vec![2]);
    assert!(matches[0].can_inline);

    let matches = index.search("ww.cnn.com");
    assert_eq!(ids(&matches), vec![2]);
    assert!(!matches[0].can_inline);

    let matches = index.search("http://www.cnn.com");
    assert_eq!(ids(&matches), vec![2]);
    assert!(matches[0].can_inline);

    let matches = index.search("tp://www.cnn.com");
    assert_eq!(ids(&matches), vec![2]);
    assert!(!matches[0].can_inline);
}

#[test]
fn test_proper_string_matching() {
    let mut index = ready_index();
    assert_eq!(index.search("atdmt view").len(), 1);
    // Both words are indexed for the row, but not as this substring
    assert!(index.search("atdmt.view").is_empty());
    assert_eq!(index.last_counts().pre_filter, 1);
    assert_eq!(index.search("view.atdmt").len(), 1);
}

#[test]
fn test_huge_result_set() {
    let mut index = ready_index();
    let now = now_secs();
    for id in 5000..6000 {
        let row = Row::new("http://www.brokeandaloneinmanitoba.com/", "").with_last_visit(now);
        assert!(index.upsert(id, row));
    }

    let matches = index.search("b");
    assert_eq!(matches.len(), IndexConfig::default().max_matches);
    let counts = index.last_counts();
    assert!(counts.pre_filter >= 1000);
    assert!(counts.post_filter <= counts.pre_filter);
    assert_eq!(counts.post_scoring, 500);
}

#[test]
fn test_items_to_score_limit() {
    let config = IndexConfig {
        items_to_score_limit: Some(500),
        ..IndexConfig::default()
    };
    let mut index = ready_index_with(config);
    for id in 5000..6000 {
        index.upsert(id, Row::new("http://www.brokeandaloneinmanitoba.com/", "").with_counts(id - 4999, 0));
    }

    let matches = index.search("brokeandalone");
    let counts = index.last_counts();
    assert_eq!(counts.pre_filter, 1000);
    assert_eq!(counts.post_filter, 500);
    assert_eq!(matches.len(), 500);
    // The most visited rows survive the trim
    assert!(matches.iter().all(|m| m.history_id >= 5500));
}

#[test]
fn test_title_search() {
    let mut index = ready_index();
    assert_eq!(index.store().len(), 14);

    let matches = index.search("MORTGAGE RATE DROPS");
    assert_eq!(ids(&matches), vec![1]);
    assert_eq!(
        matches[0].row.url,
        "http://www.reuters.com/article/idUSN0839880620100708"
    );
    assert_eq!(matches[0].title_matches.len(), 3);
}

#[test]
fn test_title_change() {
    let mut index = ready_index();
    let original_terms = "lebronomics could high taxes influence";
    let new_terms = "does eat oats little lambs ivy";

    let matches = index.search(original_terms);
    assert_eq!(ids(&matches), vec![8]);
    assert!(index.search(new_terms).is_empty());

    let mut row = index.store().row(8).cloned().unwrap();
    row.title = "Does eat oats and little lambs eat ivy".to_string();
    assert!(index.upsert(8, row));

    assert_eq!(ids(&index.search(new_terms)), vec![8]);
    assert!(index.search(original_terms).is_empty());
}

#[test]
fn test_non_unique_term_character_sets() {
    let mut index = ready_index();
    for query in ["ABRA", "ABRACAD", "ABRACADABRA", "ABRACADABR", "ABRACA"] {
        let matches = index.search(query);
        assert_eq!(ids(&matches), vec![12], "query {query}");
        assert_eq!(matches[0].row.url, "http://www.ddj.com/windows/184416623");
    }
}

#[test]
fn test_typed_character_caching() {
    let mut index = ready_index();
    assert!(index.search_term_cache().is_empty());

    // Single characters are never cached
    index.search("r");
    assert!(index.search_term_cache().is_empty());

    index.search("r re");
    assert_eq!(index.search_term_cache().terms(), vec!["re"]);

    index.search("r re reco");
    assert_eq!(index.search_term_cache().terms(), vec!["re", "reco"]);

    // Terms not used by a query are dropped
    index.search("mort");
    assert_eq!(index.search_term_cache().terms(), vec!["mort"]);

    index.search("mort reco");
    assert_eq!(index.search_term_cache().terms(), vec!["mort", "reco"]);

    index.search("mort rec");
    assert_eq!(index.search_term_cache().terms(), vec!["mort", "rec"]);
}

#[test]
fn test_add_new_rows() {
    let mut index = ready_index();
    assert!(index.search("brokeandalone").is_empty());

    let row = Row::new("http://www.brokeandaloneinmanitoba.com/", "").with_last_visit(now_secs());
    assert!(index.upsert(87654321, row.clone()));
    assert_eq!(index.search("brokeandalone").len(), 1);

    // Same row again changes nothing
    assert!(!index.upsert(87654321, row));
    assert_eq!(index.search("brokeandalone").len(), 1);
}

#[test]
fn test_delete_rows() {
    let mut index = ready_index();
    assert_eq!(index.search("DrudgeReport").len(), 1);

    assert!(index.delete(5));
    assert!(index.search("DrudgeReport").is_empty());
    assert!(!index.delete(5));
    assert!(index.store().validate().is_ok());
}

#[test]
fn test_whitelisted_urls() {
    let mut index = ready_index();
    index.search("drudge");
    assert_eq!(
        index.last_counts(),
        SearchCounts {
            pre_filter: 3,
            post_filter: 2,
            post_scoring: 2
        }
    );
    assert!(index.search("alert").is_empty());

    for url in ["http://a.example/", "https://a.example/", "ftp://a.example/", "file:///tmp/a", "about:blank", "chrome://history", "mailto:a@b.example"] {
        assert!(is_allowed_scheme(url), "{url}");
    }
    for url in ["javascript:void(0)", "xmpp:a@b.example", "data:text/plain,a", "sip:a@b.example"] {
        assert!(!is_allowed_scheme(url), "{url}");
    }
}

#[test]
fn test_cache_file_path() {
    let path = HistoryIndex::cache_file_path(Path::new("/tmp/profile"));
    let parts: Vec<_> = path.components().map(|c| c.as_os_str().to_owned()).collect();
    assert_eq!(parts.last().unwrap(), "History Provider Cache");
    assert_eq!(path.parent().unwrap(), Path::new("/tmp/profile"));
}

/// Ids, scores and inline flags for `text`, scored at a fixed time
fn ranked_at(store: &Store, text: &str, now: u64) -> Vec<(u32, f64, bool)> {
    let config = IndexConfig::default();
    let mut cache = SearchTermCache::new();
    let scorer = Scorer::with_now(ScoringWeights::default(), now);
    QueryExecutor::with_scorer(store, &mut cache, &config, scorer)
        .execute(&parse_query(text))
        .matches
        .iter()
        .map(|m| (m.history_id, m.raw_score, m.can_inline))
        .collect()
}

fn ids_and_inline(matches: &[ScoredMatch]) -> Vec<(u32, bool)> {
    matches.iter().map(|m| (m.history_id, m.can_inline)).collect()
}

#[test]
fn test_cache_save_restore() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = HistoryIndex::with_profile_dir(IndexConfig::default(), dir.path());
    assert_eq!(index.init(&mut source(), "en").indexed, 14);
    let path = index.persist().unwrap().unwrap();
    assert!(path.exists());

    let mut restored = HistoryIndex::with_profile_dir(IndexConfig::default(), dir.path());
    assert_eq!(restored.state(), IndexState::Uninitialized);
    assert!(restored.load().unwrap());
    assert_eq!(restored.state(), IndexState::Ready);
    assert_eq!(restored.stats(), index.stats());

    for (id, row) in index.store().rows() {
        assert_eq!(restored.store().row(id), Some(row));
    }

    let now = now_secs();
    let terms = ["drudge", "cnn", "http://www.", "fubar", "mice", "b", "x", "z y x", "drudgere "];
    for term in terms {
        assert_eq!(
            ids_and_inline(&restored.search(term)),
            ids_and_inline(&index.search(term)),
            "{term}"
        );
        assert_eq!(
            ranked_at(restored.store(), term, now),
            ranked_at(index.store(), term, now),
            "{term}"
        );
    }
    assert!(restored.store().validate().is_ok());
}
