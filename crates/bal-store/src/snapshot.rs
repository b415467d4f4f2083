use std::path::{Path, PathBuf};

use bal_types::StoreRecord;
use lmdb::{Cursor, Database, Environment, EnvironmentFlags, RoCursor, RoTransaction, Transaction};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// How to open a store snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Named database to scan. `None` scans the main (unnamed) database.
    pub database: Option<String>,
}

impl ScanOptions {
    pub fn named(database: impl Into<String>) -> Self {
        Self { database: Some(database.into()) }
    }
}

/// A local LMDB snapshot opened for reading only.
pub struct StoreSnapshot {
    path: PathBuf,
    env: Environment,
    db: Database,
}

impl std::fmt::Debug for StoreSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSnapshot").field("path", &self.path).finish()
    }
}

impl StoreSnapshot {
    /// Open the store at `path`.
    ///
    /// `path` is normally an LMDB environment directory (holding `data.mdb`).
    /// A path to a single data file is opened in no-subdirectory mode.
    pub fn open(path: &Path, options: &ScanOptions) -> StoreResult<Self> {
        let unavailable = |reason: String| StoreError::Unavailable {
            path: path.to_path_buf(),
            reason,
        };

        let meta = std::fs::metadata(path).map_err(|e| unavailable(e.to_string()))?;
        let mut flags = EnvironmentFlags::READ_ONLY | EnvironmentFlags::NO_LOCK;
        if meta.is_file() {
            flags |= EnvironmentFlags::NO_SUB_DIR;
        }

        let mut builder = Environment::new();
        builder.set_flags(flags);
        if options.database.is_some() {
            builder.set_max_dbs(1);
        }
        let env = builder.open(path).map_err(|e| unavailable(e.to_string()))?;

        let db = env
            .open_db(options.database.as_deref())
            .map_err(|e| match &options.database {
                Some(name) => unavailable(format!("database {name:?}: {e}")),
                None => unavailable(e.to_string()),
            })?;

        info!(path = %path.display(), database = ?options.database, "opened store snapshot");
        Ok(Self { path: path.to_path_buf(), env, db })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin a read-only transaction over the snapshot.
    pub fn begin(&self) -> StoreResult<ScanTxn<'_>> {
        let txn = self.env.begin_ro_txn().map_err(|e| StoreError::Unavailable {
            path: self.path.clone(),
            reason: format!("read transaction: {e}"),
        })?;
        Ok(ScanTxn { txn, db: self.db })
    }
}

/// A read transaction on a [`StoreSnapshot`]. Aborted on drop.
pub struct ScanTxn<'env> {
    txn: RoTransaction<'env>,
    db: Database,
}

impl ScanTxn<'_> {
    /// Lazily iterate every record from the first key to the last.
    ///
    /// Each call opens a fresh cursor positioned at the first key.
    pub fn records(&self) -> StoreResult<Records<'_>> {
        let mut cursor = self.txn.open_ro_cursor(self.db).map_err(|e| StoreError::Read {
            after: 0,
            reason: format!("open cursor: {e}"),
        })?;
        let iter = cursor.iter_start();
        Ok(Records { iter, _cursor: cursor, yielded: 0, done: false })
    }
}

/// Lazy, finite sequence of records in key order.
///
/// Once exhausted, or after yielding an error, the sequence stays empty.
pub struct Records<'txn> {
    // Declared before the cursor it walks so it is dropped first.
    iter: lmdb::Iter<'txn>,
    _cursor: RoCursor<'txn>,
    yielded: u64,
    done: bool,
}

impl Records<'_> {
    /// Number of records produced so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }
}

impl Iterator for Records<'_> {
    type Item = StoreResult<StoreRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.iter.next() {
            Some(Ok((key, value))) => {
                self.yielded += 1;
                Some(Ok(StoreRecord::new(key, value)))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(StoreError::Read { after: self.yielded, reason: e.to_string() }))
            }
            None => {
                self.done = true;
                debug!(records = self.yielded, "scan exhausted");
                None
            }
        }
    }
}
