/// Input validators for account fields
///
/// Every validator trims its input and returns the normalized value that
/// should be stored. Usernames and emails are lowercased.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_FULL_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // Channel handles end up in URLs (`/c/{username}`)
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z0-9][a-z0-9_.-]*$").unwrap();

    static ref URL_REGEX: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

/// Validates an email address and returns it lowercased
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    // Local part longer than 64 chars is not deliverable
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a username and returns it lowercased
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let normalized = username.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if normalized.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username".to_string(), MIN_USERNAME_LENGTH));
    }

    if normalized.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if !USERNAME_REGEX.is_match(&normalized) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(normalized)
}

/// Validates a display name
pub fn is_valid_full_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("fullName".to_string()));
    }

    if trimmed.len() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::TooLong("fullName".to_string(), MAX_FULL_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("fullName".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates the URL of an already-hosted image (avatar, cover image)
pub fn is_valid_image_url(field: &str, url: &str) -> Result<String, ValidationError> {
    let trimmed = url.trim();

    if !URL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert_eq!(is_valid_email("maulik@test.com").unwrap(), "maulik@test.com");
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(is_valid_email("  Maulik@Test.COM ").unwrap(), "maulik@test.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@a.").is_err());
    }

    #[test]
    fn test_username_is_lowercased() {
        assert_eq!(is_valid_username("Maulik").unwrap(), "maulik");
    }

    #[test]
    fn test_invalid_username() {
        assert!(is_valid_username("").is_err());
        assert!(is_valid_username("ab").is_err());
        assert!(is_valid_username("has space").is_err());
        assert!(is_valid_username("slash/name").is_err());
        assert!(is_valid_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(is_valid_full_name(" maulik patel ").unwrap(), "maulik patel");
        assert!(is_valid_full_name("").is_err());
        assert!(is_valid_full_name("Name\0with\0null").is_err());
        assert!(is_valid_full_name(&"a".repeat(257)).is_err());
    }

    #[test]
    fn test_image_url() {
        assert!(is_valid_image_url("avatar", "https://cdn.example.com/a.png").is_ok());
        assert!(is_valid_image_url("avatar", "not a url").is_err());
        assert!(is_valid_image_url("avatar", "ftp://example.com/a.png").is_err());
    }
}
