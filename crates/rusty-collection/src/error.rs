// File: src/error.rs
// Purpose: Library error taxonomy

use thiserror::Error;

use crate::validation::ValidationException;

/// Errors raised by collections, the rule registry and the validator
#[derive(Debug, Error)]
pub enum Error {
    /// STRICT-mode construction or assignment touched undeclared fields
    #[error("Unknown field(s) on {record}: {}", .keys.join(", "))]
    UnknownField { record: String, keys: Vec<String> },

    /// A rule name with no registered predicate. Programming error, never
    /// deferred into the aggregate.
    #[error("Unknown validation rule `{0}`")]
    UnknownRule(String),

    /// Aggregate failure of one validation pass
    #[error(transparent)]
    Invalid(#[from] ValidationException),
}

impl Error {
    /// The aggregate error map, when this is a validation failure
    pub fn validation(&self) -> Option<&ValidationException> {
        match self {
            Error::Invalid(exception) => Some(exception),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
