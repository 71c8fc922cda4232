use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// Length of an encoded token: 16 random bytes in unpadded base32
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// Purpose a token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Activation,
    Authentication,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Authentication => "authentication",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "activation" => Some(Self::Activation),
            "authentication" => Some(Self::Authentication),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SHA-256 digest of a token plaintext
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Digests are lookup keys, keep them out of logs.
impl std::fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenHash(..)")
    }
}

/// Stored form of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub hash: TokenHash,
    pub user_id: UserId,
    pub expiry: DateTime<Utc>,
    pub scope: Scope,
}

impl TokenRecord {
    pub fn is_live(&self, scope: Scope, now: DateTime<Utc>) -> bool {
        self.scope == scope && self.expiry > now
    }
}

/// A freshly issued token
///
/// Produced only by the issuer, together with its record, so a plaintext
/// never exists without a matching digest.
#[derive(Clone, Serialize)]
pub struct IssuedToken {
    #[serde(rename = "token")]
    plaintext: String,
    expiry: DateTime<Utc>,
    #[serde(skip)]
    record: TokenRecord,
}

impl IssuedToken {
    pub(crate) fn new(plaintext: String, record: TokenRecord) -> Self {
        Self {
            plaintext,
            expiry: record.expiry,
            record,
        }
    }

    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    pub fn record(&self) -> &TokenRecord {
        &self.record
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"[REDACTED]")
            .field("record", &self.record)
            .finish()
    }
}
