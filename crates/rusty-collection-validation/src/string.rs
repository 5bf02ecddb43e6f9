//! String validation functions

use alloc::format;
use alloc::string::String;

/// Validates string length (counted in characters)
pub fn validate_min_length(s: &str, min: usize) -> Result<(), String> {
    if s.chars().count() >= min {
        Ok(())
    } else {
        Err(format!("Must be at least {} characters", min))
    }
}

pub fn validate_max_length(s: &str, max: usize) -> Result<(), String> {
    if s.chars().count() <= max {
        Ok(())
    } else {
        Err(format!("Must be at most {} characters", max))
    }
}

pub fn validate_length(s: &str, min: usize, max: usize) -> Result<(), String> {
    let len = s.chars().count();
    if len >= min && len <= max {
        Ok(())
    } else {
        Err(format!("Must be between {} and {} characters", min, max))
    }
}

/// String matching validators
pub fn contains(s: &str, substring: &str) -> bool {
    s.contains(substring)
}

pub fn not_contains(s: &str, substring: &str) -> bool {
    !s.contains(substring)
}

pub fn starts_with(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

pub fn ends_with(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// Blank means empty or whitespace-only
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// URL validation (basic)
pub fn is_valid_url(url: &str) -> bool {
    let after_protocol = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(after) => after,
        None => return false,
    };

    // Must have at least a domain
    !after_protocol.is_empty() && after_protocol.contains('.')
}

/// Enum/value restriction
pub fn is_one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_characters() {
        // 4 characters, 8 bytes
        assert!(validate_max_length("ßßßß", 4).is_ok());
        assert!(validate_length("ßßßß", 4, 4).is_ok());
        assert_eq!(validate_min_length("ab", 3).unwrap_err(), "Must be at least 3 characters");
        assert_eq!(validate_max_length("abcd", 3).unwrap_err(), "Must be at most 3 characters");
        assert_eq!(
            validate_length("ab", 3, 12).unwrap_err(),
            "Must be between 3 and 12 characters"
        );
    }

    #[test]
    fn test_affixes() {
        assert!(contains("order-42", "-"));
        assert!(not_contains("order-42", "#"));
        assert!(starts_with("sku_123", "sku_"));
        assert!(!ends_with("report.csv", ".pdf"));
    }

    #[test]
    fn test_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \t"));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn test_url() {
        assert!(is_valid_url("https://example.com/path"));
        assert!(is_valid_url("http://test.co.uk"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("http://nodomain"));
    }

    #[test]
    fn test_one_of() {
        assert!(is_one_of("draft", &["draft", "published"]));
        assert!(!is_one_of("archived", &["draft", "published"]));
    }
}
