use std::collections::BTreeMap;
use std::path::Path;

use bal_ledger::{DecodeTally, DecodedRecord};
use bal_types::{DecodedValue, RecordId};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ReportError, ReportResult};
use crate::json;

/// Every scanned record, keyed by hex id, in store key order.
///
/// The dump is the full, unfiltered output of the decode stage. Persisted, it
/// is a JSON object mapping hex key to the structured document, the plain
/// text, or the opaque hex string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeDump {
    records: Vec<DecodedRecord>,
}

impl DecodeDump {
    /// Collect decoded records. A repeated key keeps its last value.
    pub fn from_records<I: IntoIterator<Item = DecodedRecord>>(records: I) -> Self {
        let mut by_id: BTreeMap<RecordId, DecodedValue> = BTreeMap::new();
        for record in records {
            if let Some(previous) = by_id.insert(record.id.clone(), record.value) {
                warn!(record = %record.id, kind = %previous.kind(), "duplicate key, earlier value replaced");
            }
        }
        Self {
            records: by_id.into_iter().map(|(id, value)| DecodedRecord { id, value }).collect(),
        }
    }

    pub fn records(&self) -> &[DecodedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tally(&self) -> DecodeTally {
        let mut tally = DecodeTally::default();
        for record in &self.records {
            tally.record(&record.value);
        }
        tally
    }

    pub fn write(&self, path: &Path) -> ReportResult<()> {
        json::write_pretty(path, self)?;
        info!(path = %path.display(), records = self.len(), "wrote decode dump");
        Ok(())
    }

    /// Read a dump written by [`DecodeDump::write`].
    ///
    /// Every JSON value except a string comes back structured. Strings come
    /// back as text, since the persisted form does not tell plain text, opaque
    /// hex and a structured string apart.
    pub fn load(path: &Path) -> ReportResult<Self> {
        let doc: Value = json::read(path)?;
        let Value::Object(map) = doc else {
            return Err(ReportError::InvalidDump {
                path: path.to_path_buf(),
                reason: "top level is not an object".into(),
            });
        };

        let mut records = Vec::with_capacity(map.len());
        for (key, value) in map {
            let id = RecordId::from_hex(&key).map_err(|e| ReportError::InvalidDump {
                path: path.to_path_buf(),
                reason: format!("key {key:?}: {e}"),
            })?;
            let value = match value {
                Value::String(s) => DecodedValue::Text(s),
                doc => DecodedValue::Structured(doc),
            };
            records.push(DecodedRecord { id, value });
        }
        let dump = Self::from_records(records);
        info!(path = %path.display(), records = dump.len(), "loaded decode dump");
        Ok(dump)
    }
}

impl Serialize for DecodeDump {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.id.to_hex(), &record.value)?;
        }
        map.end()
    }
}
