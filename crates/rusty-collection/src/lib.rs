// Rusty Collection - typed property bags with multi-source validation
// Declared records, dotted-path projection, dirty tracking and a rule engine
// that reports every failure of a pass at once

pub mod collection;
pub mod config;
pub mod dirty;
pub mod error;
pub mod rules;
pub mod schema;
pub mod validation;
pub mod value;

// Re-export the derive macro (macro namespace; shares its name with the struct)
pub use rusty_collection_macro::Collection;

// Re-export core types
pub use collection::{Collection, Mode, Projection, UnknownKey};
pub use config::{Config, EmptyString, RequiredPolicy, ValidationConfig};
pub use dirty::DirtyTracker;
pub use error::{Error, Result};
pub use rules::{Predicate, RuleRegistry, RuleViolation};
pub use schema::{FieldDef, FieldKind, FieldType, Record, RuleSpec, Schema, SchemaBuilder, Visibility};
pub use validation::{
    ErrorBag, ErrorMap, InlineRules, ReflectedRules, RuleSource, RuleTable, RuleTriple, Strategy,
    ValidationException, Validator, ValidatorState, DEFAULT_SCENARIO,
};
pub use value::Value;

// Pure predicate functions, usable without a collection
pub use rusty_collection_validation as predicates;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
