//! Token infrastructure
//!
//! Issuing and verifying opaque bearer tokens, plus the token stores.

mod authenticator;
mod generator;
mod postgres_repository;
mod repository;

pub use authenticator::TokenAuthenticator;
pub use generator::{hash_token, EntropySource, OsEntropy, TokenGenerator, TOKEN_BYTES};
pub use postgres_repository::PostgresTokenRepository;
pub use repository::InMemoryTokenRepository;
