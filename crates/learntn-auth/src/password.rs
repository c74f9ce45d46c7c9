//! Salted one-way password hashing (argon2id, PHC string format)

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;

use crate::error::{AuthError, Result};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Internal(format!("Stored password hash is unreadable: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Run one full verification for a login whose account does not exist
///
/// Always answers `false`. The reference hash is produced once per process
/// with the same parameters as real hashes, so both login failures cost the
/// same argon2 work.
pub fn verify_missing_account(password: &str) -> Result<bool> {
    static REFERENCE: OnceLock<String> = OnceLock::new();
    let reference = match REFERENCE.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password("learntn-missing-account")?;
            REFERENCE.get_or_init(|| hash)
        }
    };
    verify_password(password, reference)?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_account_never_matches() {
        assert!(!verify_missing_account("learntn-missing-account").unwrap());
        assert!(!verify_missing_account("anything").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }
}
