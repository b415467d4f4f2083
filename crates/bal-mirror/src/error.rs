use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("authentication as {username} failed: {reason}")]
    Authentication { username: String, reason: String },

    #[error("credential file {path:?} unusable: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("listing {path} failed: {reason}")]
    Listing { path: String, reason: String },

    #[error("transfer of {path} failed: {reason}")]
    Transfer { path: String, reason: String },

    #[error("refusing remote entry name {name:?} in {parent}")]
    InvalidEntryName { parent: String, name: String },

    #[error("local I/O error at {path:?}: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type MirrorResult<T> = Result<T, MirrorError>;
