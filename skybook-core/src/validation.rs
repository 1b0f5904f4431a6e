//! Input rules enforced by the core regardless of what the presentation
//! layer checked beforehand.

use crate::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use skybook_shared::SeatLabel;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,4}$")
        .expect("email pattern is a valid regex")
});

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Emails are compared trimmed and lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> CoreResult<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!("Invalid email format: {}", email)))
    }
}

pub fn validate_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

pub fn parse_seat(raw: &str) -> CoreResult<SeatLabel> {
    SeatLabel::parse(raw).map_err(CoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last-name@mail.example.bg").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@b.toolongtld").is_err());
        assert!(validate_email("spaces in@b.com").is_err());
        assert!(validate_email("josé@b.com").is_err());
        assert!(validate_email("a@bücher.de").is_err());
        assert!(validate_email("a@b.ρω").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("password1").is_ok());
        assert!(validate_password("1234567").is_err());
        // 8 bytes, 4 characters
        assert!(validate_password("ŝŝŝŝ").is_err());
        assert!(validate_password("ŝŝŝŝŝŝŝŝ").is_ok());
    }

    #[test]
    fn test_parse_seat_maps_to_validation_error() {
        assert!(matches!(parse_seat("Z0"), Err(CoreError::ValidationError(_))));
        assert_eq!(parse_seat("z9").unwrap().as_str(), "Z9");
    }
}
