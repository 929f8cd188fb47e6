use thiserror::Error;

/// Reasons a cache blob can be rejected on restore
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache blob truncated at byte {0}")]
    Truncated(usize),

    #[error("not a history cache (bad magic)")]
    BadMagic,

    #[error("unsupported cache version {actual}, expected {expected}")]
    UnsupportedVersion { expected: u32, actual: u32 },

    #[error("invalid utf-8 string at byte {0}")]
    InvalidString(usize),

    #[error("invalid character code point {0:#x}")]
    InvalidChar(u32),

    #[error("id set not strictly increasing at byte {0}")]
    UnsortedIds(usize),

    #[error("{0} trailing bytes after cache payload")]
    TrailingBytes(usize),

    #[error("index shape mismatch: {0}")]
    Shape(String),
}

/// Main error type for history index operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("history backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("malformed history row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("cache corrupt: {0}")]
    CacheCorrupt(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index service stopped")]
    ServiceStopped,
}

/// Result type alias for history index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Whether the caller should throw the cache away and rebuild from history
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, IndexError::CacheCorrupt(_))
    }
}
