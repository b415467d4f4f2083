//! Foundation types for balance lookup.
//!
//! This crate provides the identifiers and value types shared by every stage
//! of the pipeline. Every other `bal-*` crate depends on `bal-types`.
//!
//! # Key Types
//!
//! - [`RecordId`]: Raw store key, displayed and persisted as lowercase hex
//! - [`Address`]: Owning address of a ledger entry
//! - [`Amount`] / [`Balance`]: Smallest-unit quantities and their sums
//! - [`DecodedValue`]: A record value cast into one of three representations

pub mod address;
pub mod error;
pub mod record;
pub mod value;

pub use address::{Address, Amount, Balance};
pub use error::TypeError;
pub use record::{RecordId, StoreRecord};
pub use value::{DecodedValue, ValueKind};
