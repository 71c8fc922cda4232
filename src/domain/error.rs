use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Field name to message map produced by validation
pub type FieldErrors = BTreeMap<String, String>;

/// Core domain errors
///
/// Gate failures (rate limit, authentication, authorization) share this enum with
/// store failures so every stage of a request reports through one taxonomy.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: Duration },

    /// Malformed, unknown, expired and wrong-scope credentials all collapse here
    #[error("invalid or missing authentication token")]
    InvalidCredential,

    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("your user account must be activated to access this resource")]
    InactiveAccount,

    #[error("your user account doesn't have the necessary permissions to access this resource")]
    PermissionDenied,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Entropy source failure: {message}")]
    EntropyFailure { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation failed: {errors:?}")]
    Validation { errors: FieldErrors },

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn entropy(message: impl Into<String>) -> Self {
        Self::EntropyFailure {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    /// Validation failure on a single field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        Self::Validation { errors }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may recover by re-fetching and resubmitting
    pub fn is_edit_conflict(&self) -> bool {
        matches!(self, Self::EditConflict)
    }
}
