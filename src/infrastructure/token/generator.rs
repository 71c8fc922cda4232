//! Token generation
//!
//! 16 bytes from the OS random source, base32 encoded without padding.

use std::fmt::Debug;
use std::sync::Arc;

use base32::Alphabet;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::{DomainError, IssuedToken, Scope, TokenHash, TokenRecord, UserId};

/// Number of random bytes behind each token
pub const TOKEN_BYTES: usize = 16;

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync + Debug {
    fn fill(&self, buf: &mut [u8]) -> Result<(), DomainError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), DomainError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| DomainError::entropy(e.to_string()))
    }
}

/// SHA-256 of the token's ASCII form
pub fn hash_token(plaintext: &str) -> TokenHash {
    let digest = Sha256::digest(plaintext.as_bytes());
    TokenHash::from_bytes(digest.into())
}

/// Generator for bearer tokens
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    entropy: Arc<dyn EntropySource>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

impl TokenGenerator {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Generate a token owned by `user_id`, valid until `now + ttl`
    pub fn generate(
        &self,
        user_id: UserId,
        ttl: Duration,
        scope: Scope,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, DomainError> {
        let expiry = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DomainError::invariant(format!("token ttl {} overflows expiry", ttl)))?;

        let mut random_bytes = [0u8; TOKEN_BYTES];
        self.entropy.fill(&mut random_bytes)?;

        let plaintext = base32::encode(Alphabet::Rfc4648 { padding: false }, &random_bytes);
        let record = TokenRecord {
            hash: hash_token(&plaintext),
            user_id,
            expiry,
            scope,
        };

        Ok(IssuedToken::new(plaintext, record))
    }
}
