//! Collection validation functions

use alloc::format;
use alloc::string::{String, ToString};

/// Validates minimum number of items in a collection
pub fn validate_min_items<T>(items: &[T], min: usize) -> Result<(), String> {
    if items.len() >= min {
        Ok(())
    } else {
        Err(format!("Must have at least {} items", min))
    }
}

/// Validates maximum number of items in a collection
pub fn validate_max_items<T>(items: &[T], max: usize) -> Result<(), String> {
    if items.len() <= max {
        Ok(())
    } else {
        Err(format!("Must have at most {} items", max))
    }
}

/// Validates all items in collection are unique
///
/// Only needs `PartialEq` so it also works for float-bearing values.
pub fn validate_unique<T: PartialEq>(items: &[T]) -> Result<(), String> {
    let duplicate = items
        .iter()
        .enumerate()
        .any(|(i, item)| items[..i].contains(item));

    if duplicate {
        Err("All items must be unique".to_string())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_counts() {
        let tags = ["rust", "serde", "tracing"];
        assert!(validate_min_items(&tags, 3).is_ok());
        assert!(validate_max_items(&tags, 3).is_ok());
        assert_eq!(validate_min_items(&tags, 4).unwrap_err(), "Must have at least 4 items");
        assert_eq!(validate_max_items(&tags, 2).unwrap_err(), "Must have at most 2 items");
    }

    #[test]
    fn test_unique() {
        assert!(validate_unique(&["a", "b"]).is_ok());
        assert!(validate_unique(&["a", "b", "a"]).is_err());
        // Floats only need PartialEq
        assert!(validate_unique(&[0.5, 1.5]).is_ok());
        assert!(validate_unique::<u8>(&[]).is_ok());
    }
}
