/// Input validators for account fields.
///
/// Emails are trimmed and lowercased before validation so lookups and the
/// unique index always see one canonical form.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 50;
const MIN_NAME_LENGTH: usize = 2;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalizes an email address.
/// Returns the canonical (trimmed, lowercased) form.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if normalized.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(
            "email".to_string(),
            MIN_EMAIL_LENGTH,
        ));
    }

    if normalized.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(
            "email".to_string(),
            MAX_EMAIL_LENGTH,
        ));
    }

    if !EMAIL_REGEX.is_match(&normalized) || normalized.matches('@').count() != 1 {
        return Err(ValidationError::InvalidFormat(
            "email has invalid format".to_string(),
        ));
    }

    // Local part longer than 64 octets is invalid per RFC 5321
    if let Some(at_pos) = normalized.find('@') {
        if normalized[..at_pos].len() > 64 {
            return Err(ValidationError::InvalidFormat(
                "email has invalid format".to_string(),
            ));
        }
    }

    Ok(normalized)
}

/// Validates a first or last name. Returns the trimmed value.
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort(field.to_string(), MIN_NAME_LENGTH));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(format!(
            "{} contains invalid characters",
            field
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_emails_pass() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(
            is_valid_email("  Patient@Example.COM ").unwrap(),
            "patient@example.com"
        );
    }

    #[test]
    fn invalid_email_formats_fail() {
        assert!(is_valid_email("notanemail").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@bc").is_err());
    }

    #[test]
    fn oversized_local_part_fails() {
        let email = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&email).is_err());
    }

    #[test]
    fn valid_names_pass() {
        assert_eq!(is_valid_name("firstName", " John ").unwrap(), "John");
        assert!(is_valid_name("lastName", "O'Brien").is_ok());
        assert!(is_valid_name("lastName", "Jean-Pierre").is_ok());
    }

    #[test]
    fn name_length_limits() {
        assert!(is_valid_name("firstName", "J").is_err());
        assert!(is_valid_name("firstName", &"a".repeat(51)).is_err());
        assert!(is_valid_name("firstName", "").is_err());
    }

    #[test]
    fn control_characters_rejected() {
        assert!(is_valid_name("firstName", "Ann\0e").is_err());
        assert!(is_valid_name("firstName", "An\tne").is_err());
    }
}
