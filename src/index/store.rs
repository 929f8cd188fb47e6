//! The in-memory inverted index over history rows.
//!
//! Words live in an arena (`word_list`) addressed by [`WordId`]; freed slots
//! are left empty and their ids pushed onto `available_words` for reuse.
//! Four maps hang off the arena:
//!
//! - `word_map`: word -> id
//! - `char_word_map`: character -> ids of words containing it
//! - `word_id_history_map`: word id -> rows containing the word
//! - `history_id_word_map`: row -> word ids (the exact inverse of the above)
//!
//! A word whose row set becomes empty is removed from every map at once.

use crate::error::CacheError;
use crate::index::types::{HistoryId, Row, WordId};
use crate::utils::{char_set_from, strip_credentials, word_set_from};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// A row with its words already extracted, ready to be applied to a [`Store`].
/// Tokenizing is the expensive half of an upsert and needs no access to the
/// store, so full scans prepare rows in parallel.
#[derive(Debug, Clone)]
pub struct PreparedRow {
    pub id: HistoryId,
    pub row: Row,
    pub words: BTreeSet<String>,
}

impl PreparedRow {
    pub fn new(id: HistoryId, mut row: Row) -> Self {
        if let std::borrow::Cow::Owned(stripped) = strip_credentials(&row.url) {
            row.url = stripped;
        }
        let mut words = word_set_from(&row.url.to_lowercase());
        words.extend(word_set_from(&row.title.to_lowercase()));
        Self { id, row, words }
    }
}

/// Size figures for a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub rows: usize,
    pub words: usize,
    pub free_word_slots: usize,
    pub chars: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) word_list: Vec<String>,
    pub(crate) available_words: Vec<WordId>,
    pub(crate) word_map: FxHashMap<String, WordId>,
    pub(crate) char_word_map: FxHashMap<char, RoaringBitmap>,
    pub(crate) word_id_history_map: FxHashMap<WordId, RoaringBitmap>,
    pub(crate) history_id_word_map: FxHashMap<HistoryId, RoaringBitmap>,
    pub(crate) history_info_map: FxHashMap<HistoryId, Row>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed rows
    pub fn len(&self) -> usize {
        self.history_info_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history_info_map.is_empty()
    }

    pub fn row(&self, id: HistoryId) -> Option<&Row> {
        self.history_info_map.get(&id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (HistoryId, &Row)> {
        self.history_info_map.iter().map(|(&id, row)| (id, row))
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_map.get(word).copied()
    }

    pub fn word(&self, id: WordId) -> Option<&str> {
        self.word_list
            .get(id as usize)
            .map(String::as_str)
            .filter(|w| !w.is_empty())
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            rows: self.history_info_map.len(),
            words: self.word_map.len(),
            free_word_slots: self.available_words.len(),
            chars: self.char_word_map.len(),
        }
    }

    /// Insert or replace a row. Returns false when the row was already
    /// indexed with identical data.
    pub fn upsert(&mut self, id: HistoryId, row: Row) -> bool {
        self.apply(PreparedRow::new(id, row))
    }

    pub fn apply(&mut self, prepared: PreparedRow) -> bool {
        let PreparedRow { id, row, words } = prepared;
        if self.history_info_map.get(&id) == Some(&row) {
            return false;
        }

        self.retract(id);
        let mut word_ids = RoaringBitmap::new();
        for word in &words {
            let word_id = self.add_word(word);
            word_ids.insert(word_id);
            self.word_id_history_map
                .entry(word_id)
                .or_default()
                .insert(id);
        }
        if !word_ids.is_empty() {
            self.history_id_word_map.insert(id, word_ids);
        }
        self.history_info_map.insert(id, row);
        true
    }

    /// Remove a row. Returns false when the id was not indexed.
    pub fn delete(&mut self, id: HistoryId) -> bool {
        self.retract(id);
        self.history_info_map.remove(&id).is_some()
    }

    fn add_word(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.word_map.get(word) {
            return id;
        }

        let id = match self.available_words.pop() {
            Some(id) => {
                self.word_list[id as usize] = word.to_owned();
                id
            }
            None => {
                self.word_list.push(word.to_owned());
                (self.word_list.len() - 1) as WordId
            }
        };
        self.word_map.insert(word.to_owned(), id);
        for c in word.chars() {
            self.char_word_map.entry(c).or_default().insert(id);
        }
        id
    }

    /// Drop every word association of a row, collecting orphaned words
    fn retract(&mut self, id: HistoryId) {
        let Some(word_ids) = self.history_id_word_map.remove(&id) else {
            return;
        };
        for word_id in word_ids.iter() {
            let orphaned = match self.word_id_history_map.get_mut(&word_id) {
                Some(history_ids) => {
                    history_ids.remove(id);
                    history_ids.is_empty()
                }
                None => false,
            };
            if orphaned {
                self.remove_word(word_id);
            }
        }
    }

    fn remove_word(&mut self, word_id: WordId) {
        self.word_id_history_map.remove(&word_id);
        let word = std::mem::take(&mut self.word_list[word_id as usize]);
        self.word_map.remove(&word);
        for c in word.chars() {
            if let Some(ids) = self.char_word_map.get_mut(&c) {
                ids.remove(word_id);
                if ids.is_empty() {
                    self.char_word_map.remove(&c);
                }
            }
        }
        self.available_words.push(word_id);
    }

    /// Ids of words containing every character in `chars`
    pub fn word_ids_with_chars(&self, chars: &BTreeSet<char>) -> RoaringBitmap {
        let mut iter = chars.iter();
        let Some(first) = iter.next() else {
            return RoaringBitmap::new();
        };
        let Some(mut word_ids) = self.char_word_map.get(first).cloned() else {
            return RoaringBitmap::new();
        };
        for c in iter {
            match self.char_word_map.get(c) {
                Some(ids) => word_ids &= ids,
                None => return RoaringBitmap::new(),
            }
            if word_ids.is_empty() {
                break;
            }
        }
        word_ids
    }

    /// Keep the word ids whose word actually contains `term`
    pub fn words_containing(&self, word_ids: &RoaringBitmap, term: &str) -> RoaringBitmap {
        word_ids
            .iter()
            .filter(|&id| self.word(id).is_some_and(|word| word.contains(term)))
            .collect()
    }

    /// Union of the rows of every word in `word_ids`
    pub fn history_ids_for_words(&self, word_ids: &RoaringBitmap) -> RoaringBitmap {
        let mut history_ids = RoaringBitmap::new();
        for word_id in word_ids.iter() {
            if let Some(ids) = self.word_id_history_map.get(&word_id) {
                history_ids |= ids;
            }
        }
        history_ids
    }

    /// Rows with a word containing `term`. `term` must be lower-cased.
    pub fn candidates(&self, term: &str) -> RoaringBitmap {
        let word_ids = self.word_ids_with_chars(&char_set_from(term));
        let word_ids = self.words_containing(&word_ids, term);
        self.history_ids_for_words(&word_ids)
    }

    /// Rows matching every term, longest terms first
    pub fn candidates_for_terms(&self, terms: &[String]) -> RoaringBitmap {
        let mut ordered: Vec<&String> = terms.iter().collect();
        ordered.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

        let mut result: Option<RoaringBitmap> = None;
        for term in ordered {
            let ids = self.candidates(term);
            let merged = match result {
                Some(acc) => acc & ids,
                None => ids,
            };
            if merged.is_empty() {
                return merged;
            }
            result = Some(merged);
        }
        result.unwrap_or_default()
    }

    /// Check every structural invariant of the maps
    pub fn validate(&self) -> Result<(), CacheError> {
        let shape = |msg: String| Err(CacheError::Shape(msg));

        let live = self.word_list.iter().filter(|w| !w.is_empty()).count();
        if live != self.word_map.len() {
            return shape(format!(
                "{} live words but {} word map entries",
                live,
                self.word_map.len()
            ));
        }
        for (word, &id) in &self.word_map {
            if self.word(id) != Some(word.as_str()) {
                return shape(format!("word map entry {word:?} points at slot {id}"));
            }
        }

        let free: BTreeSet<WordId> = self.available_words.iter().copied().collect();
        let empty_slots: BTreeSet<WordId> = self
            .word_list
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_empty())
            .map(|(i, _)| i as WordId)
            .collect();
        if free.len() != self.available_words.len() || free != empty_slots {
            return shape("free list does not match empty word slots".to_string());
        }

        for (c, word_ids) in &self.char_word_map {
            if word_ids.is_empty() {
                return shape(format!("empty character entry {c:?}"));
            }
            for id in word_ids.iter() {
                if !self.word(id).is_some_and(|w| w.contains(*c)) {
                    return shape(format!("character {c:?} lists word {id} without it"));
                }
            }
        }

        for (word, &id) in &self.word_map {
            for c in word.chars() {
                if !self.char_word_map.get(&c).is_some_and(|ids| ids.contains(id)) {
                    return shape(format!("character {c:?} missing word {id}"));
                }
            }
            match self.word_id_history_map.get(&id) {
                Some(rows) if !rows.is_empty() => {}
                _ => return shape(format!("word {word:?} has no rows")),
            }
        }

        for (&word_id, history_ids) in &self.word_id_history_map {
            if self.word(word_id).is_none() {
                return shape(format!("rows listed for freed word {word_id}"));
            }
            for history_id in history_ids.iter() {
                if !self.history_info_map.contains_key(&history_id) {
                    return shape(format!("word {word_id} lists unknown row {history_id}"));
                }
                let reverse = self.history_id_word_map.get(&history_id);
                if !reverse.is_some_and(|ids| ids.contains(word_id)) {
                    return shape(format!("row {history_id} missing word {word_id}"));
                }
            }
        }

        for (&history_id, word_ids) in &self.history_id_word_map {
            for word_id in word_ids.iter() {
                let forward = self.word_id_history_map.get(&word_id);
                if !forward.is_some_and(|ids| ids.contains(history_id)) {
                    return shape(format!("word {word_id} missing row {history_id}"));
                }
            }
        }

        Ok(())
    }
}
