//! Read-only scanning of a local LMDB store snapshot.
//!
//! The scanner opens a mirrored copy of the ledger store and yields its
//! records lazily, in the store's native key order. It never writes to the
//! store and never takes the LMDB lock file, since no writer is assumed to be
//! active on a mirror.
//!
//! # Resource discipline
//!
//! Handles nest by borrow: a [`ScanTxn`] borrows its [`StoreSnapshot`], and
//! [`Records`] borrows its `ScanTxn`. Dropping them releases the cursor, the
//! read transaction, and the environment in that order, whether the scan ran
//! to completion or was abandoned part way.

pub mod error;
pub mod snapshot;

pub use error::{StoreError, StoreResult};
pub use snapshot::{Records, ScanOptions, ScanTxn, StoreSnapshot};
