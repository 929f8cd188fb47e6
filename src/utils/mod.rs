//! Utility functions shared by the index and query layers.
//!
//! ## Modules
//!
//! - [`app_data`] - Config file and profile/cache locations
//! - [`encoding`] - Varint and delta encoding for the cache blob
//! - [`progress`] - Optional progress bars
//! - [`tokenizer`] - Word breaking and substring match extraction
//! - [`url`] - Scheme allow-list and credential stripping
//!
//! ```
//! use urlindex::utils::{deoverlap, match_term, words_from};
//!
//! let words = words_from("http://www.cnn.com/", false);
//! assert_eq!(words, vec!["http", "www", "cnn", "com"]);
//!
//! let matches = deoverlap(match_term("cnn", "http://www.cnn.com/", 0));
//! assert_eq!(matches[0].offset, 11);
//! ```

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod tokenizer;
pub mod url;

pub use app_data::*;
pub use encoding::*;
pub use tokenizer::*;
pub use url::*;
