// File: src/collection/mod.rs
// Purpose: Keyed record type with declared fields (the property bag)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

pub mod projection;

pub use projection::Projection;

use crate::config::Config;
use crate::dirty::DirtyTracker;
use crate::error::{Error, Result};
use crate::schema::{FieldDef, FieldKind, FieldType, Record, Schema};
use crate::validation::{RuleTable, Validator};
use crate::value::Value;

pub(crate) static NULL: Value = Value::Null;

/// Unknown-key policy for construction and assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unknown keys are an error
    Strict,
    /// Unknown keys are recorded as diagnostics
    #[default]
    Tidy,
    /// Unknown keys are ignored
    Lenient,
}

/// Non-fatal diagnostic recorded in TIDY mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    pub record: String,
    pub key: String,
}

/// A record instance: declared fields in declaration order, followed by
/// any dynamic fields assigned through `set` outside STRICT mode.
#[derive(Clone)]
pub struct Collection {
    schema: Arc<Schema>,
    values: IndexMap<String, Value>,
    mode: Mode,
    diagnostics: Vec<UnknownKey>,
    tracker: DirtyTracker,
}

impl Collection {
    /// Build a record from keyed input.
    ///
    /// STRICT fails before assigning anything if `initial` names undeclared
    /// keys; TIDY records them as diagnostics; LENIENT drops them.
    pub fn new<I, K, V>(schema: Arc<Schema>, initial: I, mode: Mode) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::empty(schema, mode);
        record.update(initial)?;
        Ok(record)
    }

    /// A record holding only field defaults
    pub fn empty(schema: Arc<Schema>, mode: Mode) -> Self {
        let values = schema
            .fields()
            .filter(|def| !def.is_virtual())
            .map(|def| (def.name().to_string(), def.initial_value().clone()))
            .collect();

        Self {
            schema,
            values,
            mode,
            diagnostics: Vec::new(),
            tracker: DirtyTracker::new(),
        }
    }

    /// Build a record of a statically declared type
    pub fn of<R, I, K, V>(initial: I, mode: Mode) -> Result<Self>
    where
        R: Record,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(R::schema(), initial, mode)
    }

    /// Build a record using the configured unknown-key policy
    pub fn with_config<I, K, V>(schema: Arc<Schema>, initial: I, config: &Config) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(schema, initial, config.collection.mode)
    }

    /// Build a record from a decoded JSON object
    pub fn from_json(
        schema: Arc<Schema>,
        json: serde_json::Map<String, serde_json::Value>,
        mode: Mode,
    ) -> Result<Self> {
        Self::new(schema, json, mode)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Unknown keys seen in TIDY mode
    pub fn diagnostics(&self) -> &[UnknownKey] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<UnknownKey> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Bulk assignment with the construction unknown-key policy
    pub fn update<I, K, V>(&mut self, input: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entries: Vec<(String, Value)> = input
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let unknown: Vec<String> = entries
            .iter()
            .filter(|(key, _)| !self.schema.contains(key))
            .map(|(key, _)| key.clone())
            .collect();

        if !unknown.is_empty() {
            match self.mode {
                Mode::Strict => {
                    return Err(Error::UnknownField {
                        record: self.schema.name().to_string(),
                        keys: unknown,
                    })
                }
                Mode::Tidy => {
                    for key in unknown {
                        self.note_unknown(key);
                    }
                }
                Mode::Lenient => {
                    tracing::trace!(record = %self.schema.name(), keys = ?unknown, "ignoring unknown keys");
                }
            }
        }

        // Coerce everything before the first write so a nested failure
        // leaves the record untouched
        let mut staged = Vec::with_capacity(entries.len());
        let mut nested_diagnostics = Vec::new();
        for (key, value) in entries {
            let Some(def) = self.schema.field(&key) else {
                continue;
            };
            let value = match def.kind() {
                FieldKind::Stored => self.coerce(&key, def.ty(), value, &mut nested_diagnostics)?,
                FieldKind::Virtual { .. } => value,
            };
            staged.push((key, value));
        }

        self.diagnostics.extend(nested_diagnostics);
        for (key, value) in staged {
            self.assign_coerced(&key, value);
        }
        Ok(())
    }

    /// Read a field. Virtual fields go through their getter.
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(def) = self.schema.field(key) {
            return Ok(self.read(def));
        }
        match self.values.get(key) {
            Some(value) => Ok(value.clone()),
            None if self.mode == Mode::Strict => Err(Error::UnknownField {
                record: self.schema.name().to_string(),
                keys: vec![key.to_string()],
            }),
            None => Ok(Value::Null),
        }
    }

    /// Assign a field. Outside STRICT mode an undeclared key becomes a
    /// dynamic field.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.schema.contains(key) {
            return self.assign_declared(key, value);
        }
        match self.mode {
            Mode::Strict => Err(Error::UnknownField {
                record: self.schema.name().to_string(),
                keys: vec![key.to_string()],
            }),
            Mode::Tidy => {
                self.note_unknown(key.to_string());
                self.values.insert(key.to_string(), value);
                Ok(())
            }
            Mode::Lenient => {
                self.values.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// Borrow a stored or dynamic value
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stored and dynamic fields in order. Virtual fields are not included.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_array(&self, projection: &Projection) -> IndexMap<String, Value> {
        projection::project(self, projection)
    }

    pub fn to_json(&self, projection: &Projection) -> serde_json::Value {
        Value::Object(self.to_array(projection)).to_json()
    }

    /// Make the current field values the dirty-tracking baseline
    pub fn checkpoint(&mut self) {
        self.tracker = DirtyTracker::snapshot(self);
    }

    /// Fields changed since the last checkpoint, with their current values
    pub fn dirty(&self) -> IndexMap<String, Value> {
        self.tracker.all_dirty(self)
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.tracker.is_dirty(self, field)
    }

    /// Validate with the record type's reflected, inline and table rules
    pub fn validate(&self, scenario: Option<&str>) -> Result<()> {
        Validator::for_collection(self).validate(scenario)
    }

    /// Validate against an explicit rule table only
    pub fn validate_with(&self, table: &RuleTable, scenario: Option<&str>) -> Result<()> {
        Validator::new(self).source(table.clone()).validate(scenario)
    }

    /// Value seen by validation and projection: getter for virtual fields,
    /// stored value otherwise, null when absent
    pub(crate) fn field_value(&self, key: &str) -> Value {
        match self.schema.field(key) {
            Some(def) => self.read(def),
            None => self.values.get(key).cloned().unwrap_or(Value::Null),
        }
    }

    pub(crate) fn read(&self, def: &FieldDef) -> Value {
        match def.kind() {
            FieldKind::Virtual { getter, .. } => getter
                .as_ref()
                .map(|get| get(self))
                .unwrap_or(Value::Null),
            FieldKind::Stored => self.values.get(def.name()).cloned().unwrap_or(Value::Null),
        }
    }

    fn assign_declared(&mut self, key: &str, value: Value) -> Result<()> {
        let value = match self.schema.field(key) {
            Some(def) if matches!(def.kind(), FieldKind::Stored) => {
                let mut nested_diagnostics = Vec::new();
                let value = self.coerce(key, def.ty(), value, &mut nested_diagnostics)?;
                self.diagnostics.extend(nested_diagnostics);
                value
            }
            _ => value,
        };
        self.assign_coerced(key, value);
        Ok(())
    }

    fn assign_coerced(&mut self, key: &str, value: Value) {
        let schema = Arc::clone(&self.schema);
        let Some(def) = schema.field(key) else {
            return;
        };

        match def.kind() {
            FieldKind::Virtual { setter, .. } => {
                // Setters never see null
                if value.is_null() {
                    return;
                }
                match setter {
                    Some(set) => set(self, value),
                    None => tracing::debug!(record = %schema.name(), field = key, "virtual field is read-only; assignment ignored"),
                }
            }
            FieldKind::Stored => {
                self.values.insert(key.to_string(), value);
            }
        }
    }

    /// Objects on record-typed fields become nested collections. Their TIDY
    /// diagnostics move to `diagnostics`, keyed by the dotted path.
    fn coerce(
        &self,
        field: &str,
        ty: &FieldType,
        value: Value,
        diagnostics: &mut Vec<UnknownKey>,
    ) -> Result<Value> {
        match (ty, value) {
            (FieldType::Record(nested), Value::Object(map)) => {
                let mut record = Collection::new(Arc::clone(nested), map, self.mode)?;
                diagnostics.extend(record.take_diagnostics().into_iter().map(|d| UnknownKey {
                    record: d.record,
                    key: format!("{}.{}", field, d.key),
                }));
                Ok(Value::Record(Box::new(record)))
            }
            (_, value) => Ok(value),
        }
    }

    fn note_unknown(&mut self, key: String) {
        tracing::warn!(record = %self.schema.name(), key = %key, "unknown key");
        self.diagnostics.push(UnknownKey {
            record: self.schema.name().to_string(),
            key,
        });
    }
}

impl Index<&str> for Collection {
    type Output = Value;

    /// Stored or dynamic value, null when absent
    fn index(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("schema", &self.schema.name())
            .field("mode", &self.mode)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use pretty_assertions::assert_eq;

    fn person() -> Arc<Schema> {
        Schema::builder("Person")
            .field(FieldDef::new("first", FieldType::String).nullable())
            .field(FieldDef::new("last", FieldType::String).nullable())
            .field(FieldDef::new("age", FieldType::Int).default_value(0))
            .field(
                FieldDef::virtual_field("full_name", FieldType::String)
                    .get(|c| {
                        Value::from(format!("{} {}", c["first"], c["last"]).trim().to_string())
                    })
                    .set(|c, value| {
                        let text = value.to_string();
                        let (first, last) = text.split_once(' ').unwrap_or((text.as_str(), ""));
                        c.values.insert("first".into(), Value::from(first));
                        c.values.insert("last".into(), Value::from(last));
                    }),
            )
            .build()
    }

    #[test]
    fn test_defaults_and_order() {
        let record = Collection::empty(person(), Mode::Tidy);
        let names: Vec<_> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["first", "last", "age"]);
        assert_eq!(record["age"], Value::Int(0));
        assert_eq!(record["first"], Value::Null);
    }

    #[test]
    fn test_strict_names_every_unknown_key() {
        let err = Collection::new(
            person(),
            [("first", Value::from("Ada")), ("nick", Value::from("a")), ("team", Value::from("b"))],
            Mode::Strict,
        )
        .unwrap_err();

        match err {
            Error::UnknownField { record, keys } => {
                assert_eq!(record, "Person");
                assert_eq!(keys, vec!["nick", "team"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tidy_records_diagnostics() {
        let mut record = Collection::new(
            person(),
            [("first", Value::from("Ada")), ("nick", Value::from("a"))],
            Mode::Tidy,
        )
        .unwrap();

        assert_eq!(record["first"], Value::from("Ada"));
        assert_eq!(record.value("nick"), None);
        assert_eq!(
            record.take_diagnostics(),
            vec![UnknownKey { record: "Person".into(), key: "nick".into() }]
        );
        assert!(record.diagnostics().is_empty());
    }

    #[test]
    fn test_lenient_ignores_unknown_keys() {
        let record = Collection::new(person(), [("nick", "a")], Mode::Lenient).unwrap();
        assert!(record.diagnostics().is_empty());
        assert_eq!(record.value("nick"), None);
    }

    #[test]
    fn test_virtual_setter_and_getter() {
        let mut record = Collection::new(person(), [("full_name", "Ada Lovelace")], Mode::Strict).unwrap();
        assert_eq!(record["first"], Value::from("Ada"));
        assert_eq!(record["last"], Value::from("Lovelace"));
        assert_eq!(record.get("full_name").unwrap(), Value::from("Ada Lovelace"));

        // Null never reaches the setter
        record.set("full_name", Value::Null).unwrap();
        assert_eq!(record["first"], Value::from("Ada"));
    }

    #[test]
    fn test_get_and_set_by_mode() {
        let mut strict = Collection::empty(person(), Mode::Strict);
        assert!(matches!(strict.get("nick"), Err(Error::UnknownField { .. })));
        assert!(strict.set("nick", "x").is_err());

        let mut tidy = Collection::empty(person(), Mode::Tidy);
        tidy.set("nick", "x").unwrap();
        assert_eq!(tidy.get("nick").unwrap(), Value::from("x"));
        assert_eq!(tidy.diagnostics().len(), 1);

        let lenient = Collection::empty(person(), Mode::Lenient);
        assert_eq!(lenient.get("nick").unwrap(), Value::Null);
    }

    #[test]
    fn test_nested_objects_become_records() {
        let address = Schema::builder("Address")
            .field(FieldDef::new("city", FieldType::String))
            .build();
        let schema = Schema::builder("Customer")
            .field(FieldDef::new("address", FieldType::Record(address)).nullable())
            .build();

        let input = serde_json::json!({"address": {"city": "Oslo"}});
        let record = Collection::from_json(schema.clone(), input.as_object().unwrap().clone(), Mode::Strict).unwrap();
        let nested = record["address"].as_record().unwrap();
        assert_eq!(nested["city"], Value::from("Oslo"));

        let bad = serde_json::json!({"address": {"town": "Oslo"}});
        let err = Collection::from_json(schema, bad.as_object().unwrap().clone(), Mode::Strict).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref record, .. } if record == "Address"));
    }

    fn customer() -> Arc<Schema> {
        let address = Schema::builder("Address")
            .field(FieldDef::new("city", FieldType::String))
            .build();
        Schema::builder("Customer")
            .field(FieldDef::new("name", FieldType::String).nullable())
            .field(FieldDef::new("address", FieldType::Record(address)).nullable())
            .build()
    }

    #[test]
    fn test_failed_strict_update_changes_nothing() {
        let mut record = Collection::new(customer(), [("name", "Grace")], Mode::Strict).unwrap();
        record.checkpoint();

        let bad = serde_json::json!({"town": "Oslo"});
        let err = record
            .update([("name", Value::from("Ada")), ("address", Value::from(bad))])
            .unwrap_err();

        assert_eq!(err.to_string(), "Unknown field(s) on Address: town");
        assert_eq!(record["name"], Value::from("Grace"));
        assert!(record.dirty().is_empty());
    }

    #[test]
    fn test_nested_tidy_diagnostics_reach_parent() {
        let input = serde_json::json!({"address": {"city": "Oslo", "town": "x"}});
        let mut record = Collection::from_json(customer(), input.as_object().unwrap().clone(), Mode::Tidy).unwrap();

        assert_eq!(
            record.take_diagnostics(),
            vec![UnknownKey { record: "Address".into(), key: "address.town".into() }]
        );
        assert!(record["address"].as_record().unwrap().diagnostics().is_empty());

        let nested = serde_json::json!({"zip": 1});
        record.set("address", Value::from(nested)).unwrap();
        assert_eq!(record.diagnostics()[0].key, "address.zip");
    }

    #[test]
    fn test_update_drops_unknown_keys_where_set_keeps_them() {
        let mut record = Collection::empty(person(), Mode::Tidy);
        record.update([("nick", "a")]).unwrap();
        assert_eq!(record.value("nick"), None);

        record.set("nick", "a").unwrap();
        assert_eq!(record.value("nick"), Some(&Value::from("a")));
        assert_eq!(record.diagnostics().len(), 2);
    }
}
