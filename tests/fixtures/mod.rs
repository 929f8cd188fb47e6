//! Shared browsing history used by the integration tests.

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};
use urlindex::engine::HistoryIndex;
use urlindex::index::{HistoryEntry, IndexConfig, Row, VecSource};

pub const DAY: u64 = 86_400;

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// (id, url, title, visits, typed, days since last visit; `None` = never)
type Fixture = (u32, &'static str, &'static str, u32, u32, Option<u64>);

const HISTORY: &[Fixture] = &[
    (
        1,
        "http://www.reuters.com/article/idUSN0839880620100708",
        "UPDATE 1-US 30-yr mortgage rate drops to new record low | Reuters",
        3,
        1,
        Some(2),
    ),
    (
        2,
        "http://www.cnn.com/",
        "CNN.com - Breaking News, U.S., World, Weather, Entertainment & Video News",
        20,
        10,
        Some(0),
    ),
    (
        3,
        "http://edition.cnn.com/WORLD/",
        "CNN International - Breaking, World, Business and Sports",
        2,
        0,
        Some(30),
    ),
    (5, "http://drudgereport.com/", "DRUDGE REPORT 2010", 30, 10, Some(0)),
    (6, "http://www.drudgeretort.com/", "The Drudge Retort", 2, 0, Some(10)),
    (7, "http://view.atdmt.com/CNT/iview/", "Ad tracker", 1, 0, Some(40)),
    (
        8,
        "http://www.businessandmedia.org/articles/2010/20100708120415.aspx",
        "LeBronomics: Could High Taxes Influence LeBron Where He Plays?",
        4,
        0,
        Some(5),
    ),
    (
        9,
        "https://nearlyperfectresult.com/",
        "Practically Perfect Search Result",
        50,
        20,
        Some(0),
    ),
    (
        10,
        "http://quiteuselesssearchresultxyz.com/",
        "Practically Useless Search Result",
        0,
        0,
        None,
    ),
    (11, "http://fubarfubarandfubar.com/", "Situation Normal -- FUBARED", 5, 1, Some(1)),
    (
        12,
        "http://www.ddj.com/windows/184416623",
        "Programming Magic: ABRACADABRA and friends",
        2,
        0,
        Some(60),
    ),
    (13, "http://www.cheese.example/three-blind", "Three Blind Mice", 1, 0, Some(3)),
    // Indexed but never offered
    (14, "xmpp:drudge@chat.example", "Drudge chat", 9, 0, Some(0)),
    (15, "javascript:alert('fubar')", "", 1, 0, Some(0)),
];

pub fn history() -> Vec<HistoryEntry> {
    let now = now_secs();
    HISTORY
        .iter()
        .map(|&(id, url, title, visits, typed, days_ago)| HistoryEntry {
            id,
            row: Row::new(url, title)
                .with_counts(visits, typed)
                .with_last_visit(days_ago.map_or(0, |days| now - days * DAY)),
        })
        .collect()
}

pub fn source() -> VecSource {
    VecSource::new(history())
}

pub fn ready_index() -> HistoryIndex {
    ready_index_with(IndexConfig::default())
}

pub fn ready_index_with(config: IndexConfig) -> HistoryIndex {
    let mut index = HistoryIndex::new(config);
    let report = index.init(&mut source(), "en");
    assert_eq!(report.indexed, HISTORY.len());
    index
}

pub fn ids(matches: &[urlindex::index::ScoredMatch]) -> Vec<u32> {
    matches.iter().map(|m| m.history_id).collect()
}
