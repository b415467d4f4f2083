use std::io::Write;

use crate::error::{MirrorError, MirrorResult};

/// Kind of a listed remote entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    /// Regular files and anything else that is not a directory. Symbolic
    /// links land here and are fetched through the link.
    File,
}

/// One entry found while listing a remote directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::Directory }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::File }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Read access to a remote directory tree.
///
/// Paths are `/`-separated strings in the remote's namespace. Listings never
/// include `.` or `..`.
pub trait RemoteTree {
    /// List the entries of one directory. Order is unspecified.
    fn list_dir(&mut self, path: &str) -> MirrorResult<Vec<RemoteEntry>>;

    /// Stream the full contents of a file into `sink`, returning the byte count.
    fn fetch_file(&mut self, path: &str, sink: &mut dyn Write) -> MirrorResult<u64>;

    /// Release the underlying session. Calling it more than once is allowed.
    fn close(&mut self) -> MirrorResult<()> {
        Ok(())
    }
}

/// Join a remote directory and an entry name with `/`.
pub fn join_remote(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Reject names that would escape or alias the destination directory.
pub(crate) fn validate_entry_name(parent: &str, name: &str) -> MirrorResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(MirrorError::InvalidEntryName {
            parent: parent.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_remote_variants() {
        assert_eq!(join_remote("/home/node/utxo", "data.mdb"), "/home/node/utxo/data.mdb");
        assert_eq!(join_remote("/home/node/utxo/", "data.mdb"), "/home/node/utxo/data.mdb");
        assert_eq!(join_remote("/", "etc"), "/etc");
        assert_eq!(join_remote("", "rel"), "rel");
    }

    #[test]
    fn entry_constructors() {
        assert!(RemoteEntry::directory("d").is_dir());
        assert!(!RemoteEntry::file("f").is_dir());
    }

    #[test]
    fn valid_names_pass() {
        for name in ["data.mdb", "lock.mdb", ".hidden", "a..b"] {
            assert!(validate_entry_name("/r", name).is_ok(), "{name}");
        }
    }

    #[test]
    fn escaping_names_rejected() {
        for name in ["", ".", "..", "a/b", "..\\x", "nul\0"] {
            let err = validate_entry_name("/r", name).unwrap_err();
            assert!(matches!(err, MirrorError::InvalidEntryName { .. }), "{name:?}");
        }
    }
}
