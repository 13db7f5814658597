//! One-way salted password hashing for user credentials.
//!
//! # Invariants
//! - Plaintext passwords never leave this module except as caller input.
//! - Hashes are Argon2id PHC strings carrying their own salt and params.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::thread_rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hashing or hash-parsing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialError(String);

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential error: {}", self.0)
    }
}

impl Error for CredentialError {}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialError(err.to_string()))?;
    Ok(hash.to_string())
}

/// Checks a candidate password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only for malformed hashes.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|err| CredentialError(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("s3cret"));
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &first).unwrap());
        assert!(!verify_password("wrong", &first).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("s3cret", "plaintext").is_err());
    }
}
