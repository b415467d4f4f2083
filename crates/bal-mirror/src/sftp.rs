use std::fmt;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::{Session, Sftp};
use tracing::{debug, info, warn};

use crate::error::{MirrorError, MirrorResult};
use crate::tree::{EntryKind, RemoteEntry, RemoteTree};
use crate::types::{Credentials, RemoteEndpoint};

/// A remote tree reached over SSH/SFTP with public-key authentication.
///
/// The SSH session is disconnected by [`RemoteTree::close`]; if the tree is
/// dropped without being closed, `Drop` disconnects it.
pub struct SftpTree {
    endpoint: RemoteEndpoint,
    session: Session,
    sftp: Option<Sftp>,
}

impl fmt::Debug for SftpTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpTree")
            .field("endpoint", &self.endpoint)
            .field("open", &self.sftp.is_some())
            .finish_non_exhaustive()
    }
}

impl SftpTree {
    /// Connect, handshake, authenticate, and open the SFTP subsystem.
    pub fn connect(endpoint: &RemoteEndpoint, credentials: &Credentials) -> MirrorResult<Self> {
        let connection_err = |reason: String| MirrorError::Connection {
            endpoint: endpoint.to_string(),
            reason,
        };

        info!(endpoint = %endpoint, "opening SSH session");
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|e| connection_err(e.to_string()))?;

        let mut session = Session::new().map_err(|e| connection_err(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| connection_err(e.to_string()))?;

        session
            .userauth_pubkey_file(
                &endpoint.username,
                None,
                &credentials.private_key,
                credentials.passphrase.as_deref(),
            )
            .map_err(|e| MirrorError::Authentication {
                username: endpoint.username.clone(),
                reason: e.to_string(),
            })?;
        if !session.authenticated() {
            return Err(MirrorError::Authentication {
                username: endpoint.username.clone(),
                reason: "server did not accept the key".into(),
            });
        }

        let sftp = session.sftp().map_err(|e| connection_err(e.to_string()))?;
        debug!(endpoint = %endpoint, "SFTP subsystem ready");

        Ok(Self {
            endpoint: endpoint.clone(),
            session,
            sftp: Some(sftp),
        })
    }

    fn sftp(&self) -> MirrorResult<&Sftp> {
        self.sftp.as_ref().ok_or_else(|| MirrorError::Connection {
            endpoint: self.endpoint.to_string(),
            reason: "session already closed".into(),
        })
    }
}

impl RemoteTree for SftpTree {
    fn list_dir(&mut self, path: &str) -> MirrorResult<Vec<RemoteEntry>> {
        let listing = self
            .sftp()?
            .readdir(Path::new(path))
            .map_err(|e| MirrorError::Listing { path: path.to_string(), reason: e.to_string() })?;

        let mut entries = Vec::with_capacity(listing.len());
        for (entry_path, stat) in listing {
            let name = entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| MirrorError::InvalidEntryName {
                    parent: path.to_string(),
                    name: entry_path.to_string_lossy().into_owned(),
                })?
                .to_string();
            let kind = if stat.is_dir() { EntryKind::Directory } else { EntryKind::File };
            entries.push(RemoteEntry { name, kind });
        }
        Ok(entries)
    }

    fn fetch_file(&mut self, path: &str, sink: &mut dyn Write) -> MirrorResult<u64> {
        let transfer_err = |reason: String| MirrorError::Transfer { path: path.to_string(), reason };
        let mut remote = self
            .sftp()?
            .open(Path::new(path))
            .map_err(|e| transfer_err(e.to_string()))?;
        io::copy(&mut remote, sink).map_err(|e| transfer_err(e.to_string()))
    }

    fn close(&mut self) -> MirrorResult<()> {
        // The SFTP channel must go before the session it runs on.
        if self.sftp.take().is_none() {
            return Ok(());
        }
        info!(endpoint = %self.endpoint, "closing SSH session");
        self.session
            .disconnect(None, "replication finished", None)
            .map_err(|e| MirrorError::Connection {
                endpoint: self.endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Drop for SftpTree {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(endpoint = %self.endpoint, "SSH disconnect failed: {e}");
        }
    }
}
