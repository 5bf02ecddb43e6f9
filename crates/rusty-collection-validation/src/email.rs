//! Email validation functions

use alloc::string::{String, ToString};

/// Common public email domains, used when no list is configured
pub const PUBLIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "mail.com",
    "protonmail.com",
    "yandex.com",
    "zoho.com",
];

/// Returns the first structural defect of an email address, if any.
///
/// Checks, in order:
/// - Contains exactly one '@' symbol
/// - Has content before and after '@'
/// - Local part and domain stay within RFC length limits
/// - Domain has at least one '.', no leading/trailing '.' or '-', no ".."
/// - Only allowed characters on each side
/// - TLD is at least 2 characters
///
/// Only one defect is reported per address so each malformed value yields
/// exactly one message.
pub fn email_defect(email: &str) -> Option<&'static str> {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Some("Email must contain exactly one '@'"),
    };

    if local.is_empty() {
        return Some("Email is missing the part before '@'");
    }
    if local.len() > 64 {
        return Some("Email local part must be at most 64 characters");
    }
    if domain.is_empty() {
        return Some("Email is missing a domain");
    }
    if domain.len() > 255 {
        return Some("Email domain must be at most 255 characters");
    }
    if !domain.contains('.') {
        return Some("Email domain must contain a '.'");
    }
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Some("Email domain cannot start or end with '.' or '-'");
    }
    if domain.contains("..") {
        return Some("Email domain cannot contain consecutive dots");
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || c == '.' || c == '_' || c == '-' || c == '+';
    if !local.chars().all(valid_local_chars) {
        return Some("Email contains invalid characters before '@'");
    }

    let valid_domain_chars = |c: char| c.is_alphanumeric() || c == '.' || c == '-';
    if !domain.chars().all(valid_domain_chars) {
        return Some("Email domain contains invalid characters");
    }

    // TLD must be at least 2 characters
    match domain.rfind('.') {
        Some(pos) if domain[pos + 1..].chars().count() >= 2 => None,
        _ => Some("Email top-level domain must be at least 2 characters"),
    }
}

/// Validates basic email format
pub fn is_valid_email(email: &str) -> bool {
    email_defect(email).is_none()
}

/// Validates email format, returning the specific defect on failure
pub fn validate_email(email: &str) -> Result<(), String> {
    match email_defect(email) {
        None => Ok(()),
        Some(defect) => Err(defect.to_string()),
    }
}

/// Domain part of an address (everything after the single '@')
pub fn email_domain(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, domain)| domain)
}

/// Checks if email domain is one of the given public domains (case-insensitive)
pub fn is_public_domain(email: &str, public: &[String]) -> bool {
    email_domain(email)
        .map(|domain| public.iter().any(|d| d.eq_ignore_ascii_case(domain)))
        .unwrap_or(false)
}

/// Checks if email domain is in the blocked list (case-insensitive)
pub fn is_blocked_domain(email: &str, blocked: &[String]) -> bool {
    email_domain(email)
        .map(|domain| blocked.iter().any(|b| b.eq_ignore_ascii_case(domain)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn defaults() -> Vec<String> {
        PUBLIC_DOMAINS.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.co.uk"));
        assert!(is_valid_email("user+tag@example.com"));
        assert!(is_valid_email("user_name@example-domain.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("@"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("user@example.c"));
    }

    #[test]
    fn test_one_defect_per_address() {
        assert_eq!(
            email_defect("user@@example"),
            Some("Email must contain exactly one '@'")
        );
        assert_eq!(
            email_defect("user@example"),
            Some("Email domain must contain a '.'")
        );
        assert_eq!(
            email_defect("us er@example.com"),
            Some("Email contains invalid characters before '@'")
        );
    }

    #[test]
    fn test_public_domains() {
        let public = defaults();
        assert!(is_public_domain("user@gmail.com", &public));
        assert!(is_public_domain("user@GMAIL.COM", &public)); // Case-insensitive
        assert!(!is_public_domain("user@company.com", &public));
        assert!(!is_public_domain("no-at-sign", &public));
    }

    #[test]
    fn test_blocked_domains() {
        let blocked = vec!["spam.com".to_string(), "blocked.net".to_string()];
        assert!(is_blocked_domain("user@spam.com", &blocked));
        assert!(is_blocked_domain("user@Blocked.NET", &blocked));
        assert!(!is_blocked_domain("user@allowed.com", &blocked));
    }
}
