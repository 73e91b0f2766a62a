use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("Invalid email format".to_string()));
    }
    Ok(())
}

/// Trimmed, non-empty passenger name.
pub fn validate_passenger_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Passenger name is required".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+tag@sub.domain.org"));

        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_blank_passenger_name_rejected() {
        assert!(validate_passenger_name("   ").is_err());
        assert_eq!(validate_passenger_name("  Jane Doe ").unwrap(), "Jane Doe");
    }
}
