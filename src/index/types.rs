use crate::query::scorer::ScoringWeights;
use serde::{Deserialize, Serialize};

pub use crate::utils::tokenizer::TermMatch;

/// Opaque identifier of one history row
pub type HistoryId = u32;

/// Identifier of a distinct indexed word. Only stable within a session.
pub type WordId = u32;

/// One history row as the index sees it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub typed_count: u32,
    /// Unix timestamp (seconds) of the most recent visit, 0 if unknown
    #[serde(default)]
    pub last_visit: u64,
}

impl Row {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_counts(mut self, visit_count: u32, typed_count: u32) -> Self {
        self.visit_count = visit_count;
        self.typed_count = typed_count;
        self
    }

    pub fn with_last_visit(mut self, last_visit: u64) -> Self {
        self.last_visit = last_visit;
        self
    }
}

/// A row together with its id, as produced by a history source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    #[serde(flatten)]
    pub row: Row,
}

/// A ranked completion candidate
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMatch {
    pub history_id: HistoryId,
    pub row: Row,
    pub raw_score: f64,
    pub url_matches: Vec<TermMatch>,
    pub title_matches: Vec<TermMatch>,
    /// Whether the match may be autocompleted inline in the address bar
    pub can_inline: bool,
}

/// Index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Upper bound on results returned by a search
    pub max_matches: usize,
    /// When set, candidate pools larger than this are cut down by
    /// typed count, visit count and recency before scoring
    pub items_to_score_limit: Option<usize>,
    /// Scoring weights for ranking results
    pub scoring_weights: ScoringWeights,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_matches: 500,
            items_to_score_limit: None,
            scoring_weights: ScoringWeights::default(),
        }
    }
}

/// Lifecycle of the index facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Candidate counts for the most recent search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchCounts {
    /// Raw candidates before any filtering
    pub pre_filter: usize,
    /// Survivors of the scheme filter and the optional trim
    pub post_filter: usize,
    /// Results returned after scoring and truncation
    pub post_scoring: usize,
}

/// Outcome of a full history scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub indexed: usize,
    pub skipped: usize,
    pub backend_unavailable: bool,
}
