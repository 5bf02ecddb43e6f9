// File: src/dirty.rs
// Purpose: Checksum baseline for detecting changed fields

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::collection::Collection;
use crate::value::Value;

/// Per-field checksum baseline.
///
/// Holds no reference to the collection; every query is handed the record
/// and diffs it against the baseline at call time.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    baseline: HashMap<String, String>,
}

impl DirtyTracker {
    /// Empty baseline: every field reports dirty
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline of the record's current stored and dynamic fields
    pub fn snapshot(record: &Collection) -> Self {
        let baseline = record
            .fields()
            .map(|(name, value)| (name.to_string(), checksum(value)))
            .collect();
        Self { baseline }
    }

    /// Replace the baseline wholesale
    pub fn checkpoint(&mut self, record: &Collection) {
        *self = Self::snapshot(record);
    }

    /// Current values of every field that differs from the baseline, in
    /// field order
    pub fn all_dirty(&self, record: &Collection) -> IndexMap<String, Value> {
        record
            .fields()
            .filter(|(name, value)| self.differs(name, value))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self, record: &Collection, field: &str) -> bool {
        match record.value(field) {
            Some(value) => self.differs(field, value),
            // Absent now but present at checkpoint
            None => self.baseline.contains_key(field),
        }
    }

    fn differs(&self, name: &str, value: &Value) -> bool {
        self.baseline
            .get(name)
            .map_or(true, |sum| *sum != checksum(value))
    }
}

/// Hex SHA-256 of a type-tagged encoding of the value.
///
/// Floats hash by bit pattern, so NaN and the infinities are distinct from
/// null and from each other.
pub fn checksum(value: &Value) -> String {
    let mut hasher = Sha256::new();
    feed(&mut hasher, value);
    hex::encode(hasher.finalize())
}

fn feed(hasher: &mut Sha256, value: &Value) {
    hasher.update(value.type_name().as_bytes());
    match value {
        Value::Null => {}
        Value::Bool(b) => hasher.update([u8::from(*b)]),
        Value::Int(n) => hasher.update(n.to_le_bytes()),
        Value::Float(n) => hasher.update(n.to_bits().to_le_bytes()),
        Value::String(s) => feed_str(hasher, s),
        Value::Array(items) => {
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                feed(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update((map.len() as u64).to_le_bytes());
            for (key, item) in map {
                feed_str(hasher, key);
                feed(hasher, item);
            }
        }
        Value::Record(record) => {
            feed_str(hasher, record.schema().name());
            let fields: Vec<_> = record.fields().collect();
            hasher.update((fields.len() as u64).to_le_bytes());
            for (key, item) in fields {
                feed_str(hasher, key);
                feed(hasher, item);
            }
        }
    }
}

// Length prefix keeps adjacent strings from running together
fn feed_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}
