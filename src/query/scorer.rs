//! Relevance scoring for history matches.
//!
//! A score is the weighted average of four components, each in
//! `0..=MAX_COMPONENT_SCORE`:
//! - term: how early, how completely and in what order the typed terms
//!   appear in the URL or title (best of the two)
//! - recency of the last visit
//! - visit count
//! - typed count
//!
//! Being an average of bounded components, the final score never exceeds
//! [`Scorer::max_possible_score`]. The count and recency components keep a
//! small logarithmic tail, so they still move after their main curve has
//! flattened out.

use crate::index::types::{HistoryId, Row, ScoredMatch, TermMatch};
use crate::utils::{deoverlap, is_inlineable_prefix, match_term};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Upper bound of every score component and of the final score
pub const MAX_COMPONENT_SCORE: f64 = 1000.0;

/// Matches starting at or after this byte earn no start credit
const MAX_SIGNIFICANT_START: usize = 50;

/// Coverage is measured against at most this many bytes of the field
const MAX_SIGNIFICANT_LENGTH: usize = 50;

/// Part of each count or recency component given to the logarithmic tail
const LONG_TAIL_SHARE: f64 = 0.01;

/// Configurable weights for scoring factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the term-match component in the final average
    pub term_weight: f64,
    /// Weight of visit recency
    pub recency_weight: f64,
    /// Weight of visit count
    pub visit_weight: f64,
    /// Weight of typed count
    pub typed_weight: f64,
    /// Within the term component: terms found in typed order
    pub order_weight: f64,
    /// Within the term component: how early the first match starts
    pub start_weight: f64,
    /// Within the term component: fraction of the field covered
    pub complete_weight: f64,
    /// Recency half-life in seconds
    pub recency_half_life_secs: f64,
    /// Visit count reaching ~63% of the visit component
    pub visit_scale: f64,
    /// Typed count reaching ~63% of the typed component
    pub typed_scale: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            term_weight: 4.0,
            recency_weight: 2.0,
            visit_weight: 2.0,
            typed_weight: 5.0,
            order_weight: 1.0,
            start_weight: 6.0,
            complete_weight: 3.0,
            recency_half_life_secs: 86400.0 * 14.0, // 14 days
            visit_scale: 20.0,
            typed_scale: 5.0,
        }
    }
}

/// Scorer calculates relevance scores for history matches
pub struct Scorer {
    weights: ScoringWeights,
    current_time: u64,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::with_now(weights, current_time)
    }

    /// Scorer with a fixed notion of "now"
    pub fn with_now(weights: ScoringWeights, current_time: u64) -> Self {
        Self {
            weights,
            current_time,
        }
    }

    /// Create a scorer with default weights
    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn max_possible_score() -> f64 {
        MAX_COMPONENT_SCORE
    }

    /// Score one candidate row against the query terms.
    /// Returns `None` unless every term occurs in the URL or the title.
    pub fn score(
        &self,
        history_id: HistoryId,
        row: &Row,
        terms: &[String],
        trailing_whitespace: bool,
    ) -> Option<ScoredMatch> {
        if terms.is_empty() {
            return None;
        }
        let url = row.url.to_lowercase();
        let title = row.title.to_lowercase();

        let mut url_matches = Vec::new();
        let mut title_matches = Vec::new();
        for (term_num, term) in terms.iter().enumerate() {
            let in_url = match_term(term, &url, term_num);
            let in_title = match_term(term, &title, term_num);
            if in_url.is_empty() && in_title.is_empty() {
                return None;
            }
            url_matches.extend(in_url);
            title_matches.extend(in_title);
        }
        let url_matches = deoverlap(url_matches);
        let title_matches = deoverlap(title_matches);

        let term_score = self
            .field_score(&url_matches, &url, terms)
            .max(self.field_score(&title_matches, &title, terms));

        let w = &self.weights;
        let total_weight = w.term_weight + w.recency_weight + w.visit_weight + w.typed_weight;
        let weighted = term_score * w.term_weight
            + self.recency_score(row.last_visit) * w.recency_weight
            + count_score(row.visit_count, w.visit_scale) * w.visit_weight
            + count_score(row.typed_count, w.typed_scale) * w.typed_weight;
        let raw_score = if total_weight > 0.0 {
            (weighted / total_weight).min(MAX_COMPONENT_SCORE)
        } else {
            0.0
        };

        let can_inline = !trailing_whitespace
            && terms.len() == 1
            && url_matches
                .first()
                .is_some_and(|m| m.offset == 0 || is_inlineable_prefix(&url[..m.offset]));

        Some(ScoredMatch {
            history_id,
            row: row.clone(),
            raw_score,
            url_matches,
            title_matches,
            can_inline,
        })
    }

    /// Term component for one field, given its deoverlapped matches
    fn field_score(&self, matches: &[TermMatch], text: &str, terms: &[String]) -> f64 {
        let Some(first) = matches.first() else {
            return 0.0;
        };

        // Fraction of adjacent match pairs appearing in typed order
        let order = if matches.len() > 1 {
            let pairs = matches.len() - 1;
            let out_of_order = matches
                .windows(2)
                .filter(|pair| pair[0].term_num > pair[1].term_num)
                .count();
            MAX_COMPONENT_SCORE * (pairs - out_of_order) as f64 / pairs as f64
        } else {
            MAX_COMPONENT_SCORE
        };

        // A match right after "http://" or "https://www." counts as the start
        let start_offset = if is_inlineable_prefix(&text[..first.offset]) {
            0
        } else {
            first.offset
        };
        let start = MAX_COMPONENT_SCORE
            * (MAX_SIGNIFICANT_START - start_offset.min(MAX_SIGNIFICANT_START)) as f64
            / MAX_SIGNIFICANT_START as f64;

        // Repeats of a term count log2(n + 1) times its length, not n times
        let mut occurrences = vec![0usize; terms.len()];
        for m in matches {
            occurrences[m.term_num] += 1;
        }
        let matched_len: f64 = occurrences
            .iter()
            .zip(terms)
            .filter(|(count, _)| **count > 0)
            .map(|(&count, term)| term.len() as f64 * (count as f64 + 1.0).log2())
            .sum();
        let significant_len = (text.len() as f64)
            .min(matched_len.max(MAX_SIGNIFICANT_LENGTH as f64))
            .max(1.0);
        let complete = MAX_COMPONENT_SCORE * (matched_len / significant_len).min(1.0);

        let w = &self.weights;
        let component_weight = w.order_weight + w.start_weight + w.complete_weight;
        if component_weight <= 0.0 {
            return 0.0;
        }
        let raw = (order * w.order_weight + start * w.start_weight + complete * w.complete_weight)
            / component_weight;

        // Fields holding only some of the terms are scaled down
        let distinct = occurrences.iter().filter(|&&count| count > 0).count();
        raw * distinct as f64 / terms.len() as f64
    }

    /// Exponential decay from the last visit, strictly falling with age
    fn recency_score(&self, last_visit: u64) -> f64 {
        if last_visit == 0 || self.current_time == 0 {
            return 0.0;
        }
        let age_secs = self.current_time.saturating_sub(last_visit);
        let half_life = self.weights.recency_half_life_secs;
        let decay = if half_life > 0.0 {
            (-(age_secs as f64) * std::f64::consts::LN_2 / half_life).exp()
        } else {
            0.0
        };
        let tail = 1.0 - log_fraction(age_secs as f64, u64::MAX as f64);
        MAX_COMPONENT_SCORE * ((1.0 - LONG_TAIL_SHARE) * decay + LONG_TAIL_SHARE * tail)
    }
}

/// Count mapped onto `0..=MAX_COMPONENT_SCORE`, strictly increasing over all of `u32`.
///
/// Most of the range follows `1 - e^(-count / scale)`, which is flat in `f64`
/// after a few dozen `scale`s; the logarithmic tail carries it from there.
fn count_score(count: u32, scale: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let curve = if scale > 0.0 {
        1.0 - (-f64::from(count) / scale).exp()
    } else {
        1.0
    };
    let tail = log_fraction(f64::from(count), f64::from(u32::MAX));
    MAX_COMPONENT_SCORE * ((1.0 - LONG_TAIL_SHARE) * curve + LONG_TAIL_SHARE * tail)
}

/// `ln(1 + x)` as a fraction of `ln(1 + max)`
fn log_fraction(x: f64, max: f64) -> f64 {
    x.ln_1p() / max.ln_1p()
}
