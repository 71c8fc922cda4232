//! Token domain
//!
//! Opaque bearer credentials. Only the SHA-256 digest of a token is ever
//! stored; the plaintext leaves the server once, in the issuing response.

mod entity;
mod repository;
mod validation;

pub use entity::{IssuedToken, Scope, TokenHash, TokenRecord, TOKEN_PLAINTEXT_LEN};
pub use repository::TokenRepository;
pub use validation::{is_well_formed, validate_token_plaintext};

#[cfg(test)]
pub use repository::MockTokenRepository;
