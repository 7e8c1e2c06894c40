/// Password Hashing and Verification
///
/// Thin wrapper over bcrypt. Nothing outside `User::new` and
/// `User::set_password` should call `hash_password` directly.

use bcrypt::{hash, verify};
use lazy_static::lazy_static;

use crate::error::{AppError, ValidationError};

const BCRYPT_COST: u32 = 10;
/// bcrypt silently ignores everything past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// - Password is empty or longer than bcrypt can handle
/// - Bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    check_password(password)?;

    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Reject passwords bcrypt cannot hash faithfully, before any work is done
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES));
    }

    Ok(())
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error only if the stored hash is unreadable; a wrong password is
/// `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

lazy_static! {
    /// Hash of a password nobody holds, at the production cost
    static ref DUMMY_HASH: Option<String> = hash("no-account-has-this-password", BCRYPT_COST).ok();
}

/// Spend the same bcrypt work as `verify_password` when there is no stored
/// hash to check against, so a missing account costs as long as a wrong
/// password. Always returns `false` for real input.
pub fn verify_against_dummy(password: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(dummy) => verify(password, dummy).unwrap_or(false),
        None => false,
    }
}
