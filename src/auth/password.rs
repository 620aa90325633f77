/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt. Both calls are CPU-bound;
/// handlers run them through `web::block` so they never stall a worker.

use bcrypt::{hash, verify};
use lazy_static::lazy_static;

use crate::error::{AppError, ValidationError};

/// bcrypt work factor, roughly 50-100ms per verification on server hardware
pub const HASH_COST: u32 = 10;

/// bcrypt only reads the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

lazy_static! {
    // Verified against for unknown emails
    static ref DUMMY_HASH: Option<String> = hash("chirpy-timing-equalizer", HASH_COST).ok();
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `AppError::Hashing` if the bcrypt engine fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST).map_err(|e| AppError::Hashing(e.to_string()))
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` for a wrong password. An unparsable digest is a
/// `Hashing` fault, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash).map_err(|e| AppError::Hashing(e.to_string()))
}

/// Spend one verification worth of time without a stored hash
pub fn verify_against_dummy(password: &str) {
    if let Some(dummy) = DUMMY_HASH.as_ref() {
        let _ = verify(password, dummy);
    }
}

/// Presence and length checks applied before a password is hashed
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "password".to_string(),
        )));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }

    Ok(())
}
