//! Rusty-Collection-Validation Core
//!
//! Pure Rust predicate functions compatible with both std and no_std environments.
//! The rule registry in `rusty-collection` wraps these into named rules that
//! operate on dynamic record values.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod collection;
pub mod email;
pub mod numeric;
pub mod password;
pub mod string;

// Re-export all validators
pub use collection::*;
pub use email::*;
pub use numeric::*;
pub use password::*;
pub use string::*;
