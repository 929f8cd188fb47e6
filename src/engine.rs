//! The history index facade.
//!
//! [`HistoryIndex`] owns the store, the search term cache and the lifecycle
//! state. It is single-threaded; [`crate::service::IndexService`] wraps it in
//! a worker thread for concurrent callers.

use crate::error::{IndexError, Result};
use crate::index::build::{HistorySource, build_store};
use crate::index::reader::read_cache;
use crate::index::store::{IndexStats, Store};
use crate::index::types::{HistoryId, IndexConfig, IndexState, InitReport, Row, ScoredMatch, SearchCounts};
use crate::index::writer::write_cache;
use crate::query::{QueryExecutor, SearchTermCache, parse_query};
use crate::utils::cache_file_path;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct HistoryIndex {
    state: IndexState,
    store: Store,
    cache: SearchTermCache,
    config: IndexConfig,
    profile_dir: Option<PathBuf>,
    languages: String,
    show_progress: bool,
    last_counts: SearchCounts,
}

impl HistoryIndex {
    /// An in-memory index with no cache file
    pub fn new(config: IndexConfig) -> Self {
        Self {
            state: IndexState::Uninitialized,
            store: Store::new(),
            cache: SearchTermCache::new(),
            config,
            profile_dir: None,
            languages: String::new(),
            show_progress: false,
            last_counts: SearchCounts::default(),
        }
    }

    /// An index persisting to `<profile_dir>/History Provider Cache`
    pub fn with_profile_dir(config: IndexConfig, profile_dir: &Path) -> Self {
        Self {
            profile_dir: Some(profile_dir.to_path_buf()),
            ..Self::new(config)
        }
    }

    /// Show a progress bar during full scans
    pub fn set_show_progress(&mut self, show: bool) {
        self.show_progress = show;
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == IndexState::Ready
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn stats(&self) -> IndexStats {
        self.store.stats()
    }

    pub fn search_term_cache(&self) -> &SearchTermCache {
        &self.cache
    }

    /// Counts recorded by the most recent search
    pub fn last_counts(&self) -> SearchCounts {
        self.last_counts
    }

    pub fn cache_file_path(profile_dir: &Path) -> PathBuf {
        cache_file_path(profile_dir)
    }

    /// Full scan of `source`, replacing whatever was indexed before
    pub fn init(&mut self, source: &mut dyn HistorySource, languages: &str) -> InitReport {
        self.begin_init(languages);
        let (store, report) = build_store(source, self.show_progress);
        self.install(store);
        report
    }

    /// Discard the store and rebuild from `source`
    pub fn rebuild(&mut self, source: &mut dyn HistorySource) -> InitReport {
        let languages = std::mem::take(&mut self.languages);
        self.init(source, &languages)
    }

    /// Enter `Initializing`: the old store is dropped and searches return nothing
    pub fn begin_init(&mut self, languages: &str) {
        self.state = IndexState::Initializing;
        self.languages = languages.to_owned();
        self.store = Store::new();
        self.cache.clear();
        self.last_counts = SearchCounts::default();
    }

    /// Swap in a fully built store and become `Ready`
    pub fn install(&mut self, store: Store) {
        self.store = store;
        self.cache.clear();
        self.state = IndexState::Ready;
    }

    pub fn upsert(&mut self, id: HistoryId, row: Row) -> bool {
        let changed = self.store.upsert(id, row);
        if changed {
            self.cache.clear();
        }
        changed
    }

    pub fn delete(&mut self, id: HistoryId) -> bool {
        let removed = self.store.delete(id);
        if removed {
            self.cache.clear();
        }
        removed
    }

    /// Ranked matches for `text`; empty until the index is ready
    pub fn search(&mut self, text: &str) -> Vec<ScoredMatch> {
        if !self.is_ready() {
            self.last_counts = SearchCounts::default();
            return Vec::new();
        }
        let query = parse_query(text);
        let outcome = QueryExecutor::new(&self.store, &mut self.cache, &self.config).execute(&query);
        self.last_counts = outcome.counts;
        outcome.matches
    }

    /// Write the cache file. Returns the path written, or `None` for an
    /// in-memory index or one that is not ready.
    pub fn persist(&self) -> Result<Option<PathBuf>> {
        let Some(profile_dir) = &self.profile_dir else {
            return Ok(None);
        };
        if !self.is_ready() {
            warn!("not persisting history index before it is ready");
            return Ok(None);
        }
        let path = cache_file_path(profile_dir);
        write_cache(&self.store, &path)?;
        Ok(Some(path))
    }

    /// Restore from the cache file. Returns false when there is no cache
    /// to read. A corrupt cache is deleted and reported as
    /// [`IndexError::CacheCorrupt`] so the caller can fall back to `init`.
    pub fn load(&mut self) -> Result<bool> {
        let Some(profile_dir) = &self.profile_dir else {
            return Ok(false);
        };
        if self.state == IndexState::Initializing {
            return Ok(false);
        }
        let path = cache_file_path(profile_dir);
        if !path.exists() {
            return Ok(false);
        }

        match read_cache(&path) {
            Ok(store) => {
                info!(rows = store.len(), path = %path.display(), "history index restored");
                self.install(store);
                Ok(true)
            }
            Err(err @ IndexError::CacheCorrupt(_)) => {
                if let Err(remove_err) = std::fs::remove_file(&path) {
                    warn!(error = %remove_err, "could not remove corrupt history cache");
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}
