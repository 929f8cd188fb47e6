use crate::index::store::Store;
use crate::index::types::{HistoryId, IndexConfig, Row, ScoredMatch, SearchCounts};
use crate::query::cache::SearchTermCache;
use crate::query::parser::ParsedQuery;
use crate::query::scorer::Scorer;
use crate::utils::is_allowed_scheme;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use tracing::debug;

/// Candidate pools at least this large are scored on the rayon pool
const PARALLEL_SCORING_THRESHOLD: usize = 256;

/// Result of one search
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub matches: Vec<ScoredMatch>,
    pub counts: SearchCounts,
}

/// Query executor: candidates, filtering, scoring and ranking
pub struct QueryExecutor<'a> {
    store: &'a Store,
    cache: &'a mut SearchTermCache,
    config: &'a IndexConfig,
    scorer: Scorer,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a Store, cache: &'a mut SearchTermCache, config: &'a IndexConfig) -> Self {
        Self {
            store,
            cache,
            config,
            scorer: Scorer::new(config.scoring_weights.clone()),
        }
    }

    /// Create executor with a specific scorer
    pub fn with_scorer(
        store: &'a Store,
        cache: &'a mut SearchTermCache,
        config: &'a IndexConfig,
        scorer: Scorer,
    ) -> Self {
        Self {
            store,
            cache,
            config,
            scorer,
        }
    }

    pub fn execute(&mut self, query: &ParsedQuery) -> SearchOutcome {
        if query.is_empty() || self.store.is_empty() {
            self.cache.clear();
            return SearchOutcome::default();
        }

        self.cache.begin_query();
        let candidates = self.candidates(&query.lookup_words);
        self.cache.end_query();

        let mut counts = SearchCounts {
            pre_filter: candidates.len() as usize,
            ..SearchCounts::default()
        };

        let mut pool: Vec<(HistoryId, &Row)> = candidates
            .iter()
            .filter_map(|id| self.store.row(id).map(|row| (id, row)))
            .filter(|(_, row)| is_allowed_scheme(&row.url))
            .collect();

        if let Some(limit) = self.config.items_to_score_limit {
            if pool.len() > limit {
                pool.sort_by(|a, b| popularity_order(a, b));
                pool.truncate(limit);
                // Cached sets no longer describe what was scored
                self.cache.clear();
            }
        }
        counts.post_filter = pool.len();

        let scorer = &self.scorer;
        let score = |&(id, row): &(HistoryId, &Row)| {
            scorer.score(id, row, &query.terms, query.trailing_whitespace)
        };
        let mut matches: Vec<ScoredMatch> = if pool.len() >= PARALLEL_SCORING_THRESHOLD {
            pool.par_iter().filter_map(score).collect()
        } else {
            pool.iter().filter_map(score).collect()
        };

        matches.sort_by(|a, b| {
            b.raw_score
                .total_cmp(&a.raw_score)
                .then_with(|| a.history_id.cmp(&b.history_id))
        });
        matches.truncate(self.config.max_matches);
        counts.post_scoring = matches.len();

        debug!(
            query = %query.lower,
            pre_filter = counts.pre_filter,
            post_filter = counts.post_filter,
            post_scoring = counts.post_scoring,
            "search complete"
        );
        SearchOutcome { matches, counts }
    }

    /// Intersect per-word candidate sets; words are already longest first
    fn candidates(&mut self, words: &[String]) -> RoaringBitmap {
        let mut result: Option<RoaringBitmap> = None;
        for word in words {
            let ids = self.cache.history_ids_for_term(self.store, word);
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
}

/// Most typed, then most visited, then most recent; id breaks ties
fn popularity_order(a: &(HistoryId, &Row), b: &(HistoryId, &Row)) -> Ordering {
    b.1.typed_count
        .cmp(&a.1.typed_count)
        .then_with(|| b.1.visit_count.cmp(&a.1.visit_count))
        .then_with(|| b.1.last_visit.cmp(&a.1.last_visit))
        .then_with(|| a.0.cmp(&b.0))
}
