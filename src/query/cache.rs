//! Per-typing-session memo of term lookups.
//!
//! While the user types "r", "re", "rec", "reco" each query reuses the
//! previous term's word set: a word containing "reco" must contain "rec",
//! so only the characters new to the longer term are intersected in before
//! the substring check. Entries not touched by the latest query are swept.

use crate::index::store::Store;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::utils::char_set_from;

#[derive(Debug, Clone)]
struct CacheEntry {
    char_set: BTreeSet<char>,
    word_ids: RoaringBitmap,
    history_ids: RoaringBitmap,
    used: bool,
}

#[derive(Debug, Default)]
pub struct SearchTermCache {
    entries: FxHashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl SearchTermCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// Cached terms in sorted order
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    /// (hits, misses) since creation
    pub fn hit_counts(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Start a query: nothing is in use until looked up again
    pub fn begin_query(&mut self) {
        for entry in self.entries.values_mut() {
            entry.used = false;
        }
    }

    /// Finish a query: drop every entry the query did not touch
    pub fn end_query(&mut self) {
        self.entries.retain(|_, entry| entry.used);
    }

    /// Longest cached proper prefix of `term`
    fn best_prefix(&self, term: &str) -> Option<&CacheEntry> {
        term.char_indices()
            .rev()
            .map(|(end, _)| end)
            .take_while(|&end| end > 0)
            .find_map(|end| self.entries.get(&term[..end]))
    }

    /// Rows with a word containing `term`, reusing and recording cache entries.
    /// Single-character terms go straight to the character map and are not cached.
    pub fn history_ids_for_term(&mut self, store: &Store, term: &str) -> RoaringBitmap {
        if term.is_empty() {
            return RoaringBitmap::new();
        }
        if let Some(entry) = self.entries.get_mut(term) {
            entry.used = true;
            self.hits += 1;
            return entry.history_ids.clone();
        }
        self.misses += 1;

        let char_set = char_set_from(term);
        let word_ids = match self.best_prefix(term) {
            Some(prefix) if prefix.word_ids.is_empty() => RoaringBitmap::new(),
            Some(prefix) => {
                let leftover: BTreeSet<char> =
                    char_set.difference(&prefix.char_set).copied().collect();
                let mut word_ids = prefix.word_ids.clone();
                if !leftover.is_empty() {
                    word_ids &= store.word_ids_with_chars(&leftover);
                }
                word_ids
            }
            None => store.word_ids_with_chars(&char_set),
        };
        let word_ids = store.words_containing(&word_ids, term);
        let history_ids = store.history_ids_for_words(&word_ids);

        if term.chars().count() > 1 {
            self.entries.insert(
                term.to_owned(),
                CacheEntry {
                    char_set,
                    word_ids,
                    history_ids: history_ids.clone(),
                    used: true,
                },
            );
        }
        history_ids
    }
}
