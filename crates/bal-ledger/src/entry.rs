use bal_types::{Address, Amount, RecordId};
use serde::Serialize;
use serde_json::Value;

/// Accepted spellings of the source-output identifier.
const OUTPUT_ID_FIELDS: &[&str] = &["output_id", "txid", "tx_hash"];
/// Accepted spellings of the source-output index.
const OUTPUT_INDEX_FIELDS: &[&str] = &["output_index", "vout", "index"];

/// An unspent output extracted from a structured record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: RecordId,
    pub address: Address,
    pub amount: Amount,
    pub output_id: Option<String>,
    pub output_index: Option<u64>,
}

/// Why a structured value could not be read as a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryDefect {
    #[error("value is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType { field: &'static str, expected: &'static str },
}

impl LedgerEntry {
    /// Read `address` and `amount` (required) and the output id and index
    /// (optional, ignored when of the wrong type) from a structured value.
    pub fn from_structured(id: RecordId, value: &Value) -> Result<Self, EntryDefect> {
        let fields = value.as_object().ok_or(EntryDefect::NotAnObject)?;

        let address = match fields.get("address") {
            None => return Err(EntryDefect::MissingField("address")),
            Some(Value::String(s)) => Address::new(s.as_str()),
            Some(_) => {
                return Err(EntryDefect::WrongType { field: "address", expected: "a string" })
            }
        };

        let amount = match fields.get("amount") {
            None => return Err(EntryDefect::MissingField("amount")),
            Some(v) => v.as_u64().ok_or(EntryDefect::WrongType {
                field: "amount",
                expected: "a non-negative integer",
            })?,
        };

        let output_id = OUTPUT_ID_FIELDS
            .iter()
            .find_map(|f| fields.get(*f))
            .and_then(Value::as_str)
            .map(str::to_string);
        let output_index = OUTPUT_INDEX_FIELDS
            .iter()
            .find_map(|f| fields.get(*f))
            .and_then(Value::as_u64);

        Ok(Self { id, address, amount, output_id, output_index })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn id() -> RecordId {
        RecordId::from_key(&[1, 2, 3])
    }

    #[test]
    fn full_entry() {
        let v = json!({"address": "addrA", "amount": 5, "output_id": "ff00", "output_index": 1});
        let entry = LedgerEntry::from_structured(id(), &v).unwrap();
        assert_eq!(entry.address, Address::from("addrA"));
        assert_eq!(entry.amount, 5);
        assert_eq!(entry.output_id.as_deref(), Some("ff00"));
        assert_eq!(entry.output_index, Some(1));
    }

    #[test]
    fn alternate_output_spellings() {
        let v = json!({"address": "a", "amount": 1, "txid": "aa", "vout": 3});
        let entry = LedgerEntry::from_structured(id(), &v).unwrap();
        assert_eq!(entry.output_id.as_deref(), Some("aa"));
        assert_eq!(entry.output_index, Some(3));
    }

    #[test]
    fn output_fields_are_optional() {
        let v = json!({"address": "a", "amount": 0});
        let entry = LedgerEntry::from_structured(id(), &v).unwrap();
        assert_eq!(entry.output_id, None);
        assert_eq!(entry.output_index, None);
        assert_eq!(entry.amount, 0);
    }

    #[test]
    fn large_amount_fits() {
        let v = json!({"address": "a", "amount": u64::MAX});
        assert_eq!(LedgerEntry::from_structured(id(), &v).unwrap().amount, u64::MAX);
    }

    #[test]
    fn missing_address() {
        let v = json!({"amount": 5});
        assert_eq!(
            LedgerEntry::from_structured(id(), &v).unwrap_err(),
            EntryDefect::MissingField("address")
        );
    }

    #[test]
    fn missing_amount() {
        let v = json!({"address": "a"});
        assert_eq!(
            LedgerEntry::from_structured(id(), &v).unwrap_err(),
            EntryDefect::MissingField("amount")
        );
    }

    #[test]
    fn non_string_address() {
        let v = json!({"address": 12, "amount": 5});
        assert!(matches!(
            LedgerEntry::from_structured(id(), &v).unwrap_err(),
            EntryDefect::WrongType { field: "address", .. }
        ));
    }

    #[test]
    fn negative_fractional_or_textual_amounts_rejected() {
        for amount in [json!(-1), json!(1.5), json!("5"), json!(null)] {
            let v = json!({"address": "a", "amount": amount});
            assert!(matches!(
                LedgerEntry::from_structured(id(), &v).unwrap_err(),
                EntryDefect::WrongType { field: "amount", .. }
            ));
        }
    }

    #[test]
    fn arrays_are_not_entries() {
        assert_eq!(
            LedgerEntry::from_structured(id(), &json!([1, 2])).unwrap_err(),
            EntryDefect::NotAnObject
        );
    }

    #[test]
    fn defect_messages() {
        assert_eq!(EntryDefect::MissingField("amount").to_string(), "missing field `amount`");
        assert_eq!(EntryDefect::NotAnObject.to_string(), "value is not a JSON object");
    }
}
