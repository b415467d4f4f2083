//! Remote tree replication for balance lookup.
//!
//! Reproduces a remote directory tree file by file under a local destination.
//! The remote side is abstracted behind [`RemoteTree`] so the same
//! [`Replicator`] drives both the SFTP source and a local-directory source.
//!
//! Replication is additive by default: local files that no longer exist
//! remotely are left in place unless [`MirrorPolicy::Prune`] is selected.

pub mod error;
pub mod local;
pub mod replicator;
pub mod sftp;
pub mod tree;
pub mod types;

pub use error::{MirrorError, MirrorResult};
pub use local::LocalTree;
pub use replicator::Replicator;
pub use sftp::SftpTree;
pub use tree::{join_remote, EntryKind, RemoteEntry, RemoteTree};
pub use types::{Credentials, MirrorPolicy, MirrorReport, RemoteEndpoint};
