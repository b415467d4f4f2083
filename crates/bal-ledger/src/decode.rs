use bal_types::{DecodedValue, RecordId, StoreRecord, ValueKind};
use serde_json::Value;

/// A record whose value has been decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    pub id: RecordId,
    pub value: DecodedValue,
}

/// Decode one raw value. Never fails.
///
/// Trial order, first success wins:
/// 1. bytes that are not UTF-8 become [`DecodedValue::Opaque`] (terminal);
/// 2. text that parses as any JSON document, scalars included, becomes
///    [`DecodedValue::Structured`];
/// 3. any other text becomes [`DecodedValue::Text`].
pub fn decode_value(bytes: &[u8]) -> DecodedValue {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return DecodedValue::Opaque(hex::encode(bytes)),
    };
    match serde_json::from_str::<Value>(text) {
        Ok(doc) => DecodedValue::Structured(doc),
        Err(_) => DecodedValue::Text(text.to_string()),
    }
}

pub fn decode_record(record: &StoreRecord) -> DecodedRecord {
    DecodedRecord {
        id: record.id(),
        value: decode_value(&record.value),
    }
}

/// Per-variant counts over a decoded record set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DecodeTally {
    pub structured: u64,
    pub text: u64,
    pub opaque: u64,
}

impl DecodeTally {
    pub fn record(&mut self, value: &DecodedValue) {
        match value.kind() {
            ValueKind::Structured => self.structured += 1,
            ValueKind::Text => self.text += 1,
            ValueKind::Opaque => self.opaque += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.structured + self.text + self.opaque
    }
}
