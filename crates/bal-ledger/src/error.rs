use bal_types::{Address, RecordId};

use crate::entry::EntryDefect;

/// Errors produced by aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("malformed ledger record {id}: {defect}")]
    MalformedRecord { id: RecordId, defect: EntryDefect },

    #[error("balance of {address} overflows")]
    BalanceOverflow { address: Address },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
