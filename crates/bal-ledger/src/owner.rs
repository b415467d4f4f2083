use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Owner name used for addresses absent from the mapping.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Address → human-readable owner name. Read once, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerMapping {
    names: HashMap<String, String>,
}

impl OwnerMapping {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Owner of `address`, or [`UNKNOWN_OWNER`].
    pub fn resolve(&self, address: &str) -> &str {
        self.names.get(address).map(String::as_str).unwrap_or(UNKNOWN_OWNER)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<A: Into<String>, O: Into<String>> FromIterator<(A, O)> for OwnerMapping {
    fn from_iter<I: IntoIterator<Item = (A, O)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(a, o)| (a.into(), o.into())).collect(),
        }
    }
}
