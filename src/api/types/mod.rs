//! Request, response and error types for the HTTP API

pub mod error;
pub mod json;
pub mod movies;
pub mod users;

pub use error::{ApiError, ApiErrorResponse, ErrorBody};
pub use json::Json;
pub use movies::{
    CreateMovieRequest, MessageEnvelope, MovieEnvelope, MoviesEnvelope, UpdateMovieRequest,
};
pub use users::{
    ActivateUserBody, AuthenticationTokenEnvelope, CreateAuthenticationTokenBody,
    RegisterUserBody, UserEnvelope,
};
