use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid decode dump {path:?}: {reason}")]
    InvalidDump { path: PathBuf, reason: String },

    #[error("spreadsheet error at {path:?}: {reason}")]
    Spreadsheet { path: PathBuf, reason: String },
}

pub type ReportResult<T> = Result<T, ReportError>;
