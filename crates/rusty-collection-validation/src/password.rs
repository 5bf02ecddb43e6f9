//! Password validation functions

use alloc::string::{String, ToString};

/// Password strength levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    /// 6+ characters minimum
    Basic,
    /// 8+ chars with uppercase, lowercase, and digit
    Medium,
    /// 8+ chars with uppercase, lowercase, digit, and special character
    Strong,
}

impl PasswordStrength {
    /// Parse a strength level, `None` for anything unrecognised
    ///
    /// # Examples
    /// ```
    /// use rusty_collection_validation::password::PasswordStrength;
    /// assert_eq!(PasswordStrength::parse("basic"), Some(PasswordStrength::Basic));
    /// assert_eq!(PasswordStrength::parse("strong"), Some(PasswordStrength::Strong));
    /// assert_eq!(PasswordStrength::parse("extreme"), None);
    /// ```
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "basic" | "weak" => Some(PasswordStrength::Basic),
            "medium" => Some(PasswordStrength::Medium),
            "strong" => Some(PasswordStrength::Strong),
            _ => None,
        }
    }
}

/// Validates password against a strength level
///
/// Returns the first unmet requirement.
pub fn validate_password(password: &str, level: &str) -> Result<(), String> {
    match PasswordStrength::parse(level) {
        Some(PasswordStrength::Basic) => validate_basic(password),
        Some(PasswordStrength::Medium) => validate_medium(password),
        Some(PasswordStrength::Strong) => validate_strong(password),
        None => Err("Invalid strength level. Use 'basic', 'medium', or 'strong'".to_string()),
    }
}

fn first_failure(checks: &[(bool, &str)]) -> Result<(), String> {
    checks
        .iter()
        .find(|(valid, _)| !valid)
        .map(|(_, msg)| Err(msg.to_string()))
        .unwrap_or(Ok(()))
}

fn validate_basic(password: &str) -> Result<(), String> {
    first_failure(&[(
        password.chars().count() >= 6,
        "Password must be at least 6 characters",
    )])
}

fn validate_medium(password: &str) -> Result<(), String> {
    first_failure(&[
        (password.chars().count() >= 8, "Password must be at least 8 characters"),
        (password.chars().any(|c| c.is_uppercase()), "Password must contain at least one uppercase letter"),
        (password.chars().any(|c| c.is_lowercase()), "Password must contain at least one lowercase letter"),
        (password.chars().any(|c| c.is_numeric()), "Password must contain at least one digit"),
    ])
}

fn validate_strong(password: &str) -> Result<(), String> {
    validate_medium(password)?;
    first_failure(&[(
        password.chars().any(|c| {
            matches!(c, '@' | '$' | '!' | '%' | '*' | '?' | '&' | '#' | '-' | '_' | '+' | '=' | '.' | ',')
        }),
        "Password must contain at least one special character (@$!%*?&#-_+=.,)",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_password() {
        assert!(validate_password("simple", "basic").is_ok());
        assert!(validate_password("123456", "basic").is_ok());
        assert!(validate_password("short", "basic").is_err());
    }

    #[test]
    fn test_medium_password() {
        assert!(validate_password("Password123", "medium").is_ok());
        assert!(validate_password("Test1234", "medium").is_ok());
        assert!(validate_password("lowercase1", "medium").is_err());
        assert!(validate_password("UPPERCASE1", "medium").is_err());
        assert!(validate_password("NoDigits", "medium").is_err());
        assert!(validate_password("Short1A", "medium").is_err());
    }

    #[test]
    fn test_strong_password() {
        assert!(validate_password("Password123!", "strong").is_ok());
        assert!(validate_password("Secure@Pass1", "strong").is_ok());
        assert!(validate_password("NoSpecial123", "strong").is_err());
        assert!(validate_password("nouppercas!1", "strong").is_err());
        assert!(validate_password("NOLOWERCASE!1", "strong").is_err());
        assert!(validate_password("NoDigits!Aa", "strong").is_err());
    }

    #[test]
    fn test_unknown_level() {
        assert!(validate_password("whatever", "extreme").is_err());
    }
}
