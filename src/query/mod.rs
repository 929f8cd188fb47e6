pub mod cache;
pub mod executor;
pub mod parser;
pub mod scorer;

pub use cache::SearchTermCache;
pub use executor::{QueryExecutor, SearchOutcome};
pub use parser::{ParsedQuery, parse_query};
pub use scorer::{Scorer, ScoringWeights};
