//! Password hashing with Argon2

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a plaintext password into a PHC string
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Whether `password` matches `hash`; an unparseable hash never matches
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("pa55word").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("pa55word", &hash));
        assert!(!hasher.verify("pa55w0rd", &hash));
    }

    #[test]
    fn test_salted() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("pa55word").unwrap(), hasher.hash("pa55word").unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = Argon2Hasher::new();

        assert!(!hasher.verify("pa55word", "invalid_hash_format"));
        assert!(!hasher.verify("pa55word", ""));
    }
}
