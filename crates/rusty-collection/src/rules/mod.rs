// File: src/rules/mod.rs
// Purpose: Rule registry and built-in rules

mod builtins;
pub mod registry;

pub use registry::{Predicate, RuleRegistry, RuleViolation};
