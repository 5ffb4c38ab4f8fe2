//! Client-side sign-up validation.
//!
//! These checks run before any network call; a failure is an inline
//! validation error and no request is issued.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{KokoroError, Result};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Minimum password length the provider accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Checks the email has a plausible shape. Real validation is the
/// provider's confirmation mail; this only catches obvious typos locally.
pub fn validate_email(email: &str) -> Result<()> {
    if !EMAIL_PATTERN.is_match(email.trim()) {
        return Err(KokoroError::validation(format!(
            "'{}' is not a valid email address",
            email.trim()
        )));
    }
    Ok(())
}

/// Checks the password meets the provider's minimum length.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(KokoroError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Checks the confirmation matches the password.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(KokoroError::validation("passwords do not match"));
    }
    Ok(())
}

/// Runs all sign-up preconditions in order.
pub fn validate_sign_up(email: &str, password: &str, confirmation: &str) -> Result<()> {
    validate_email(email)?;
    validate_password(password)?;
    validate_password_confirmation(password, confirmation)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("  user@example.com  ").is_ok());
        assert!(validate_email("user@example").is_err());
        assert!(validate_email("user example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_confirmation_mismatch_is_validation_error() {
        let err = validate_password_confirmation("secret1", "secret2").unwrap_err();
        assert!(err.is_validation());
        assert!(validate_password_confirmation("secret1", "secret1").is_ok());
    }

    #[test]
    fn test_sign_up_runs_all_checks() {
        assert!(validate_sign_up("user@example.com", "secret1", "secret1").is_ok());
        assert!(validate_sign_up("bad-email", "secret1", "secret1").is_err());
        assert!(validate_sign_up("user@example.com", "secret1", "other").is_err());
    }
}
