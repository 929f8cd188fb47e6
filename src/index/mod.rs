pub mod build;
pub mod reader;
pub mod stats;
pub mod store;
pub mod types;
pub mod writer;

pub use build::{HistorySource, JsonlSource, VecSource, build_store};
pub use reader::{decode_store, read_cache};
pub use store::{IndexStats, PreparedRow, Store};
pub use types::*;
pub use writer::{encode_store, write_cache};
