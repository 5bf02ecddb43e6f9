//! Numeric validation functions

use alloc::format;
use alloc::string::{String, ToString};

/// Validates minimum value for numeric types
pub fn validate_min<T: PartialOrd + core::fmt::Display>(value: T, min: T) -> Result<(), String> {
    if value >= min {
        Ok(())
    } else {
        Err(format!("Must be at least {}", min))
    }
}

/// Validates maximum value for numeric types
pub fn validate_max<T: PartialOrd + core::fmt::Display>(value: T, max: T) -> Result<(), String> {
    if value <= max {
        Ok(())
    } else {
        Err(format!("Must be at most {}", max))
    }
}

/// Validates value is within range (bounds inclusive)
pub fn validate_range<T: PartialOrd + core::fmt::Display>(
    value: T,
    min: T,
    max: T,
) -> Result<(), String> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(format!("Must be between {} and {}", min, max))
    }
}

/// Validates a strictly positive integer
pub fn validate_positive(value: i64) -> Result<(), String> {
    if value > 0 {
        Ok(())
    } else {
        Err("Must be a positive integer".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_min(18, 18).is_ok());
        assert!(validate_max(120, 120).is_ok());
        assert!(validate_range(10.0, 10.0, 20.0).is_ok());
        assert!(validate_range(20.0, 10.0, 20.0).is_ok());
    }

    #[test]
    fn test_messages_name_the_bounds() {
        assert_eq!(validate_min(17, 18).unwrap_err(), "Must be at least 18");
        assert_eq!(validate_max(121, 120).unwrap_err(), "Must be at most 120");
        assert_eq!(validate_range(9.5, 10.0, 20.0).unwrap_err(), "Must be between 10 and 20");
    }

    #[test]
    fn test_positive() {
        assert!(validate_positive(5).is_ok());
        assert_eq!(validate_positive(-5).unwrap_err(), "Must be a positive integer");
        assert!(validate_positive(0).is_err());
    }
}
