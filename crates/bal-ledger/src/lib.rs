//! Record decoding and balance aggregation.
//!
//! This crate turns raw store records into an ordered balance sheet:
//! - [`decode_value`] casts each value into a [`DecodedValue`](bal_types::DecodedValue),
//!   trying structured JSON, then plain text, then opaque hex
//! - [`LedgerEntry`] extracts address and amount from a structured value
//! - [`Aggregator`] groups entries by address, resolves owners through an
//!   [`OwnerMapping`], and sorts the result deterministically

pub mod aggregate;
pub mod decode;
pub mod entry;
pub mod error;
pub mod owner;

pub use aggregate::{summarize, Aggregator, BalanceRow, BalanceSheet, MalformedPolicy, SkippedRecord};
pub use decode::{decode_record, decode_value, DecodeTally, DecodedRecord};
pub use entry::{EntryDefect, LedgerEntry};
pub use error::{LedgerError, LedgerResult};
pub use owner::{OwnerMapping, UNKNOWN_OWNER};
