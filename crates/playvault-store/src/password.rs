// ABOUTME: Argon2id password hashing for the users table, stored as PHC strings.
// ABOUTME: A stored secret that does not parse as a PHC string is a legacy plaintext secret.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::StoreError;

/// Hash `password` with a fresh random salt and the default argon2id parameters.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Check `password` against a stored secret.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => password == stored,
    }
}

/// True if the stored secret predates hashing and should be rewritten.
pub fn is_legacy(stored: &str) -> bool {
    PasswordHash::new(stored).is_err()
}
