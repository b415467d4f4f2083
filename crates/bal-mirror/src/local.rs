use std::fs::{self, File};
use std::io::{self, Write};

use crate::error::{MirrorError, MirrorResult};
use crate::tree::{EntryKind, RemoteEntry, RemoteTree};

/// A "remote" tree that is a directory on the local filesystem.
///
/// Used for offline runs against a mounted or previously copied store, and
/// as the source side in replication tests. Listings are sorted by name.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalTree;

impl LocalTree {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteTree for LocalTree {
    fn list_dir(&mut self, path: &str) -> MirrorResult<Vec<RemoteEntry>> {
        let listing_err = |e: io::Error| MirrorError::Listing {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(listing_err)? {
            let entry = entry.map_err(listing_err)?;
            let name = entry.file_name().into_string().map_err(|raw| {
                MirrorError::InvalidEntryName {
                    parent: path.to_string(),
                    name: raw.to_string_lossy().into_owned(),
                }
            })?;
            // Like an SFTP listing, this does not follow symbolic links.
            let kind = if entry.file_type().map_err(listing_err)?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(RemoteEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn fetch_file(&mut self, path: &str, sink: &mut dyn Write) -> MirrorResult<u64> {
        let transfer_err = |e: io::Error| MirrorError::Transfer {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let mut file = File::open(path).map_err(transfer_err)?;
        io::copy(&mut file, sink).map_err(transfer_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_and_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mdb"), b"b").unwrap();
        fs::write(dir.path().join("a.mdb"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut tree = LocalTree::new();
        let entries = tree.list_dir(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            entries,
            vec![
                RemoteEntry::file("a.mdb"),
                RemoteEntry::file("b.mdb"),
                RemoteEntry::directory("sub"),
            ]
        );
    }

    #[test]
    fn fetch_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mdb");
        fs::write(&path, [0u8, 1, 2, 255]).unwrap();

        let mut sink = Vec::new();
        let n = LocalTree.fetch_file(path.to_str().unwrap(), &mut sink).unwrap();
        assert_eq!(n, 4);
        assert_eq!(sink, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn missing_directory_is_listing_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = LocalTree.list_dir(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, MirrorError::Listing { .. }));
    }

    #[test]
    fn missing_file_is_transfer_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.mdb");
        let err = LocalTree.fetch_file(missing.to_str().unwrap(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, MirrorError::Transfer { .. }));
    }
}
