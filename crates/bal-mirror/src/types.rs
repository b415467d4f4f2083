use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, MirrorResult};

/// Address and login of the remote node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl RemoteEndpoint {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self { host: host.into(), port, username: username.into() }
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// Private-key credential for public-key authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub private_key: PathBuf,
    pub passphrase: Option<String>,
}

impl Credentials {
    /// Check that the key file exists and is a readable regular file.
    ///
    /// The key itself is parsed by the SSH library during authentication.
    pub fn load(private_key: &Path, passphrase: Option<String>) -> MirrorResult<Self> {
        let meta = std::fs::metadata(private_key).map_err(|e| MirrorError::Credentials {
            path: private_key.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !meta.is_file() {
            return Err(MirrorError::Credentials {
                path: private_key.to_path_buf(),
                reason: "not a regular file".into(),
            });
        }
        std::fs::File::open(private_key).map_err(|e| MirrorError::Credentials {
            path: private_key.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { private_key: private_key.to_path_buf(), passphrase })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What happens to local files that have no remote counterpart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorPolicy {
    /// Never delete anything under the destination.
    #[default]
    Additive,
    /// After a complete copy, delete local files and directories that were
    /// not part of the remote tree.
    Prune,
}

/// Counters for one replication run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    pub directories: u64,
    pub files: u64,
    pub bytes: u64,
    pub pruned: u64,
}
