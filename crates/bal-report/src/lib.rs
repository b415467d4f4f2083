//! Persistence for balance lookup.
//!
//! Everything the pipeline reads from or writes to disk apart from the store
//! itself:
//! - [`DecodeDump`]: every record id mapped to its decoded value
//! - [`load_owner_mapping`]: the address → owner document
//! - [`write_balance_json`] / [`write_balance_xlsx`]: the balance report in
//!   two formats carrying the same `(owner, address, balance)` rows
//!
//! JSON documents are written with four-space indentation.

pub mod balance;
pub mod dump;
pub mod error;
mod json;
pub mod owners;
pub mod sheet;

pub use balance::{read_balance_json, write_balance_json};
pub use dump::DecodeDump;
pub use error::{ReportError, ReportResult};
pub use owners::load_owner_mapping;
pub use sheet::{balance_table, write_balance_xlsx, Cell, SHEET_HEADER, SHEET_NAME};
