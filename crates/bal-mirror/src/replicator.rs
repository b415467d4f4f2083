use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{MirrorError, MirrorResult};
use crate::tree::{join_remote, validate_entry_name, EntryKind, RemoteTree};
use crate::types::{MirrorPolicy, MirrorReport};

/// Copies a remote tree into a local destination, file by file.
///
/// Traversal uses an explicit stack of pending directories, so tree depth is
/// bounded by memory rather than by the call stack. Each directory is created
/// locally before its listing is processed. The first failure of any kind
/// aborts the run; no pruning happens after a failed copy.
#[derive(Clone, Debug, Default)]
pub struct Replicator {
    policy: MirrorPolicy,
}

impl Replicator {
    pub fn new(policy: MirrorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MirrorPolicy {
        self.policy
    }

    /// Reproduce every file under `remote_root` beneath `destination`.
    pub fn replicate<T: RemoteTree + ?Sized>(
        &self,
        tree: &mut T,
        remote_root: &str,
        destination: &Path,
    ) -> MirrorResult<MirrorReport> {
        info!(remote_root, destination = %destination.display(), "replicating remote tree");

        let mut report = MirrorReport::default();
        let mut kept_dirs: HashSet<PathBuf> = HashSet::new();
        let mut kept_files: HashSet<PathBuf> = HashSet::new();
        let mut pending = vec![(remote_root.to_string(), destination.to_path_buf())];

        while let Some((remote_dir, local_dir)) = pending.pop() {
            fs::create_dir_all(&local_dir).map_err(|source| MirrorError::Local {
                path: local_dir.clone(),
                source,
            })?;
            report.directories += 1;

            for entry in tree.list_dir(&remote_dir)? {
                validate_entry_name(&remote_dir, &entry.name)?;
                let remote_path = join_remote(&remote_dir, &entry.name);
                let local_path = local_dir.join(&entry.name);

                match entry.kind {
                    EntryKind::Directory => pending.push((remote_path, local_path)),
                    EntryKind::File => {
                        debug!(remote = %remote_path, local = %local_path.display(), "downloading");
                        report.bytes += copy_file(tree, &remote_path, &local_path)?;
                        report.files += 1;
                        kept_files.insert(local_path);
                    }
                }
            }
            kept_dirs.insert(local_dir);
        }

        if self.policy == MirrorPolicy::Prune {
            report.pruned = prune(destination, &kept_dirs, &kept_files)?;
        }

        info!(
            directories = report.directories,
            files = report.files,
            bytes = report.bytes,
            pruned = report.pruned,
            "replication complete"
        );
        Ok(report)
    }
}

fn copy_file<T: RemoteTree + ?Sized>(
    tree: &mut T,
    remote_path: &str,
    local_path: &Path,
) -> MirrorResult<u64> {
    let transfer_err = |e: std::io::Error| MirrorError::Transfer {
        path: remote_path.to_string(),
        reason: format!("{}: {e}", local_path.display()),
    };

    // Stage next to the target so the final rename stays on one filesystem.
    // A failed transfer drops the staging file and leaves the target as it was.
    let dir = local_path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(transfer_err)?;
    let bytes = {
        let mut writer = BufWriter::new(staged.as_file_mut());
        let bytes = tree.fetch_file(remote_path, &mut writer)?;
        writer.flush().map_err(transfer_err)?;
        bytes
    };
    staged.persist(local_path).map_err(|e| transfer_err(e.error))?;
    Ok(bytes)
}

/// Delete everything under `destination` that the copy did not produce.
fn prune(
    destination: &Path,
    kept_dirs: &HashSet<PathBuf>,
    kept_files: &HashSet<PathBuf>,
) -> MirrorResult<u64> {
    let mut removed = 0;
    for entry in WalkDir::new(destination).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| MirrorError::Local {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| destination.to_path_buf()),
            source: e.into(),
        })?;
        let path = entry.path();
        let local_err = |source| MirrorError::Local { path: path.to_path_buf(), source };

        if entry.file_type().is_dir() {
            if !kept_dirs.contains(path) {
                fs::remove_dir(path).map_err(local_err)?;
                debug!(path = %path.display(), "pruned stale directory");
                removed += 1;
            }
        } else if !kept_files.contains(path) {
            fs::remove_file(path).map_err(local_err)?;
            debug!(path = %path.display(), "pruned stale file");
            removed += 1;
        }
    }
    Ok(removed)
}
