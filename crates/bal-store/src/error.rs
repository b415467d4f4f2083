use std::path::PathBuf;

/// Errors from store scanning.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path does not hold a store that can be opened for reading.
    #[error("store unavailable at {path:?}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// A read failed part way through a scan.
    #[error("store read failed after {after} record(s): {reason}")]
    Read { after: u64, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
