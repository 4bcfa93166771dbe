//! Password hashing and verification.
//!
//! # Invariants
//! - Only Argon2id PHC strings are stored; raw passwords never reach SQL.
//! - Verification never reports why a check failed.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub struct CredentialError(argon2::password_hash::Error);

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl Error for CredentialError {}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CredentialError)
}

/// Returns whether `password` matches the stored PHC string.
///
/// An unparsable stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("p1").expect("hash should succeed");
        let second = hash_password("p1").expect("hash should succeed");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("p1", &first));
        assert!(verify_password("p1", &second));
        assert!(!verify_password("wrong", &first));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("p1", "p1"));
        assert!(!verify_password("", ""));
    }
}
