// File: src/rules/registry.rs
// Purpose: Name -> predicate table shared by every validator

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::config::ValidationConfig;
use crate::error::{Error, Result};
use crate::value::Value;

/// A single rule failure. Never escapes the validator; it is converted into
/// an entry of the aggregate error map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleViolation {
    message: String,
}

impl RuleViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for RuleViolation {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for RuleViolation {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Returns normally when the value is valid, a violation otherwise
pub type Predicate = Arc<dyn Fn(&Value, &[Value]) -> Result<(), RuleViolation> + Send + Sync>;

static GLOBAL: Lazy<RwLock<RuleRegistry>> = Lazy::new(|| RwLock::new(RuleRegistry::new()));

/// Rule name -> predicate table. Built-ins are installed on construction;
/// later registrations for the same name override silently.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, Predicate>,
}

impl RuleRegistry {
    /// Registry with built-ins and default configuration
    pub fn new() -> Self {
        Self::from_config(&ValidationConfig::default())
    }

    /// Registry with built-ins; domain rules use the configured lists
    pub fn from_config(config: &ValidationConfig) -> Self {
        let mut registry = Self::empty();
        super::builtins::install(&mut registry, config);
        registry
    }

    /// Registry without any rules
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Add or replace a named predicate
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, &[Value]) -> Result<(), RuleViolation> + Send + Sync + 'static,
    {
        self.register_predicate(name, Arc::new(predicate));
    }

    pub fn register_predicate(&mut self, name: impl Into<String>, predicate: Predicate) {
        let name = name.into();
        if self.rules.insert(name.clone(), predicate).is_some() {
            tracing::debug!(rule = %name, "overriding validation rule");
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Predicate> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Snapshot of the process-wide registry
    pub fn global() -> RuleRegistry {
        GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Register into the process-wide registry. Takes the write lock, so
    /// it is safe to call while other threads snapshot the registry.
    pub fn register_global<F>(name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, &[Value]) -> Result<(), RuleViolation> + Send + Sync + 'static,
    {
        GLOBAL
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, predicate);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let registry = RuleRegistry::new();
        for name in ["required", "positiveInt", "range", "email", "length", "type"] {
            assert!(registry.contains(name), "missing built-in {}", name);
        }
    }

    #[test]
    fn test_unknown_rule() {
        let registry = RuleRegistry::empty();
        let err = registry.resolve("nope").err().unwrap();
        assert!(matches!(err, Error::UnknownRule(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "Unknown validation rule `nope`");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = RuleRegistry::new();
        registry.register("required", |_, _| Err(RuleViolation::new("custom required")));

        let predicate = registry.resolve("required").unwrap();
        let err = predicate(&Value::from("present"), &[]).unwrap_err();
        assert_eq!(err.message(), "custom required");
    }

    #[test]
    fn test_global_registration() {
        RuleRegistry::register_global("registryTestEven", |value, _| match value.as_integer() {
            Some(n) if n % 2 != 0 => Err("Must be even".into()),
            _ => Ok(()),
        });

        let snapshot = RuleRegistry::global();
        let predicate = snapshot.resolve("registryTestEven").unwrap();
        assert!(predicate(&Value::Int(4), &[]).is_ok());
        assert!(predicate(&Value::Int(3), &[]).is_err());
    }
}
