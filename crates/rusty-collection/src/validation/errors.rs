// File: src/validation/errors.rs
// Purpose: Per-pass error aggregation and the aggregate failure value

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// `{field: {rule: message}}`, fields in first-failure order, rules in
/// execution order
pub type ErrorMap = IndexMap<String, IndexMap<String, String>>;

/// Collects rule failures during one validation pass
#[derive(Debug, Clone, Default)]
pub struct ErrorBag {
    errors: ErrorMap,
}

impl ErrorBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. A repeated (field, rule) pair keeps its original
    /// position but takes the later message.
    pub fn record(&mut self, field: impl Into<String>, rule: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .insert(rule.into(), message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Copy of the current error map
    pub fn to_map(&self) -> ErrorMap {
        self.errors.clone()
    }

    /// Snapshot the bag as an aggregate failure
    pub fn raise(&self) -> ValidationException {
        ValidationException::new(self.errors.clone())
    }

    /// `Ok` when nothing failed, the aggregate otherwise
    pub fn finish(self) -> Result<(), ValidationException> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationException::new(self.errors))
        }
    }
}

/// Aggregate failure of a validation pass.
///
/// Immutable once built; serializes as `{"errors": {field: {rule: message}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("Validation failed for: {summary}")]
pub struct ValidationException {
    errors: ErrorMap,
    #[serde(skip)]
    summary: String,
}

impl ValidationException {
    fn new(errors: ErrorMap) -> Self {
        let summary = errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
        Self { errors, summary }
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Comma-separated names of the failing fields
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// All failures of one field, keyed by rule
    pub fn get_errors(&self, field: &str) -> Option<&IndexMap<String, String>> {
        self.errors.get(field)
    }

    pub fn get_error(&self, field: &str, rule: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|rules| rules.get(rule))
            .map(String::as_str)
    }

    /// First failure recorded for a field
    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|rules| rules.values().next())
            .map(String::as_str)
    }

    pub fn into_map(self) -> ErrorMap {
        self.errors
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "errors": self.errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_bag_finishes_ok() {
        let bag = ErrorBag::new();
        assert!(!bag.has_errors());
        assert!(bag.finish().is_ok());
    }

    #[test]
    fn test_last_write_wins_keeps_first_order() {
        let mut bag = ErrorBag::new();
        bag.record("email", "required", "first");
        bag.record("name", "length", "too short");
        bag.record("email", "email", "bad format");
        bag.record("email", "required", "second");

        let map = bag.to_map();
        let fields: Vec<_> = map.keys().cloned().collect();
        assert_eq!(fields, vec!["email", "name"]);

        let rules: Vec<_> = map["email"].iter().map(|(r, m)| (r.as_str(), m.as_str())).collect();
        assert_eq!(rules, vec![("required", "second"), ("email", "bad format")]);
    }

    #[test]
    fn test_exception_snapshot() {
        let mut bag = ErrorBag::new();
        bag.record("id", "required", "Property is required.");
        bag.record("amount", "positiveInt", "Must be a positive integer");
        let exception = bag.raise();

        // Later recording does not leak into the raised snapshot
        bag.record("late", "required", "x");
        assert!(!exception.has_error("late"));

        assert_eq!(exception.summary(), "id, amount");
        assert_eq!(exception.to_string(), "Validation failed for: id, amount");
        assert_eq!(exception.get_error("id", "required"), Some("Property is required."));
        assert_eq!(exception.first_error("amount"), Some("Must be a positive integer"));
        assert_eq!(
            exception.to_json(),
            serde_json::json!({"errors": {
                "id": {"required": "Property is required."},
                "amount": {"positiveInt": "Must be a positive integer"}
            }})
        );
    }
}
