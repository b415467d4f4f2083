use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Quantity held by one ledger entry, in the ledger's smallest unit.
pub type Amount = u64;

/// Sum of amounts for one address.
///
/// Wider than [`Amount`] so that summing any number of entries of a single
/// address cannot silently wrap.
pub type Balance = u128;

/// Owning address of a ledger entry.
///
/// Addresses are compared by exact string equality; no normalization
/// (case folding, whitespace trimming) is applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}
