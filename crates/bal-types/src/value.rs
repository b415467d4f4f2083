use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A record value cast into exactly one of three representations.
///
/// The representations are tried in a fixed order by the decoder:
/// structured first, then plain text, then opaque hex. Only structured values
/// can carry ledger entries.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// Valid text that parsed as a JSON document of any kind.
    Structured(Value),
    /// Valid UTF-8 text that is not a structured document.
    Text(String),
    /// Lowercase hex of bytes that are not valid UTF-8.
    Opaque(String),
}

/// Tag of a [`DecodedValue`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Structured,
    Text,
    Opaque,
}

impl DecodedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Structured(_) => ValueKind::Structured,
            Self::Text(_) => ValueKind::Text,
            Self::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// The structured document, if this value is structured.
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// The persisted JSON form: the document itself, or a string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Structured(v) => v.clone(),
            Self::Text(s) | Self::Opaque(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Text => write!(f, "text"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}
