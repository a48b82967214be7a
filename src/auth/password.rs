/// Password Hashing and Verification
///
/// bcrypt hashing plus the strength policy applied to every password that
/// enters the system (registration, admin user creation, password reset).
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt only reads the first 72 bytes of input.
const MAX_PASSWORD_LENGTH: usize = 72;

const REQUIRED_SYMBOLS: &str = "@$!%*?&";

/// Hash a password after enforcing the strength policy.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Policy: 8-72 bytes, at least one uppercase letter, one lowercase letter,
/// one digit, and one of `@$!%*?&`.
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| REQUIRED_SYMBOLS.contains(c));

    if !has_uppercase || !has_lowercase || !has_digit || !has_symbol {
        return Err(AppError::Validation(ValidationError::WeakPassword(
            "password must contain at least one uppercase letter, one lowercase letter, \
             one number, and one special character (@$!%*?&)"
                .to_string(),
        )));
    }

    Ok(())
}
