//! # urlindex - History Autocomplete Index
//!
//! urlindex keeps an in-memory inverted index over browsing history so an
//! address bar can rank completions while the user types. Any row whose URL
//! or title contains every typed term as a substring is a candidate; the
//! candidates are scored on where the terms land, how recently and how
//! often the page was visited, and how often its URL was typed.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Word and character maps, full scans, cache file I/O
//! - [`query`] - Query parsing, the search term cache, scoring
//! - [`engine`] - [`HistoryIndex`], the facade tying both together
//! - [`service`] - A worker thread serializing access from many callers
//! - [`output`] - Terminal and JSON rendering of matches
//! - [`utils`] - Tokenizing, URL schemes, varint encoding, configuration
//!
//! ## Quick Start
//!
//! ```ignore
//! use urlindex::engine::HistoryIndex;
//! use urlindex::index::{IndexConfig, JsonlSource};
//! use std::path::Path;
//!
//! let mut index = HistoryIndex::with_profile_dir(IndexConfig::default(), Path::new("/tmp/profile"));
//! if !index.load()? {
//!     index.init(&mut JsonlSource::new(Path::new("history.jsonl")), "en");
//!     index.persist()?;
//! }
//!
//! for m in index.search("drudge") {
//!     println!("{:8.1} {}", m.raw_score, m.row.url);
//! }
//! ```
//!
//! ## Candidate lookup
//!
//! Each typed term is broken into characters; the character map narrows the
//! word list to words holding all of them, and a substring check keeps the
//! words that really contain the term. Results are remembered per term, so
//! typing one more character starts from the shorter term's answer.

pub mod engine;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod service;
pub mod utils;

pub use engine::HistoryIndex;
pub use error::{CacheError, IndexError, Result};
pub use service::{IndexHandle, IndexService};
