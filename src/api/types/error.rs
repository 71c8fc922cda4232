//! Error envelope returned by every endpoint

use axum::{
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domain::{DomainError, FieldErrors};

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and couldn't process your request";
pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";

/// Body of the `error` key: a message, or a field to message map for
/// validation failures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Message(String),
    Fields(FieldErrors),
}

/// `{"error": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorBody,
}

/// API error with status code and any extra response headers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
    pub headers: HeaderMap,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ErrorBody::Message(message.into()),
            },
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn failed_validation(errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            response: ApiErrorResponse {
                error: ErrorBody::Fields(errors),
            },
            headers: HeaderMap::new(),
        }
    }

    /// Missing, malformed, unknown or expired bearer token
    pub fn invalid_authentication_token() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid or missing authentication token")
            .with_header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))
    }

    /// Wrong email or password at login
    pub fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid authentication credentials")
    }

    pub fn authentication_required() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "you must be authenticated to access this resource",
        )
    }

    pub fn inactive_account() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "your user account must be activated to access this resource",
        )
    }

    pub fn not_permitted() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "your user account doesn't have the necessary permissions to access this resource",
        )
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("the {} method is not supported for this resource", method),
        )
    }

    pub fn edit_conflict() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "unable to update the record due to an edit conflict, please try again",
        )
    }

    /// 429 with a whole-second `Retry-After`
    pub fn rate_limited(retry_after: std::time::Duration) -> Self {
        let secs = retry_after
            .as_secs()
            .saturating_add(u64::from(retry_after.subsec_nanos() > 0));
        let err = Self::new(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");

        match HeaderValue::from_str(&secs.max(1).to_string()) {
            Ok(value) => err.with_header(header::RETRY_AFTER, value),
            Err(_) => err,
        }
    }

    /// Generic 500; the cause is logged, never returned
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Server error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::RateLimitExceeded { retry_after } => Self::rate_limited(retry_after),
            DomainError::InvalidCredential => Self::invalid_authentication_token(),
            DomainError::AuthenticationRequired => Self::authentication_required(),
            DomainError::InactiveAccount => Self::inactive_account(),
            DomainError::PermissionDenied => Self::not_permitted(),
            DomainError::EditConflict => Self::edit_conflict(),
            DomainError::NotFound { .. } => Self::not_found(),
            DomainError::Validation { errors } => Self::failed_validation(errors),
            DomainError::DuplicateEmail => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "email".to_string(),
                    "a user with this email address already exists".to_string(),
                );
                Self::failed_validation(errors)
            }
            err @ (DomainError::StoreUnavailable { .. }
            | DomainError::EntropyFailure { .. }
            | DomainError::InvariantViolation { .. }
            | DomainError::Internal { .. }) => Self::internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                DomainError::RateLimitExceeded {
                    retry_after: std::time::Duration::from_secs(2),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (DomainError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (DomainError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (DomainError::InactiveAccount, StatusCode::FORBIDDEN),
            (DomainError::PermissionDenied, StatusCode::FORBIDDEN),
            (DomainError::EditConflict, StatusCode::CONFLICT),
            (DomainError::not_found("movie 1"), StatusCode::NOT_FOUND),
            (DomainError::DuplicateEmail, StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::store_unavailable("timeout"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::entropy("no rng"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_server_error_hides_cause() {
        let err = ApiError::from(DomainError::store_unavailable("db at 10.0.0.3 refused"));
        assert_eq!(
            err.response.error,
            ErrorBody::Message(SERVER_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_invalid_credential_sets_www_authenticate() {
        let response = ApiError::from(DomainError::InvalidCredential).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn test_rate_limited_rounds_retry_after_up() {
        let response = ApiError::rate_limited(std::time::Duration::from_millis(250)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn test_rate_limited_saturates_retry_after() {
        let response = ApiError::from(DomainError::RateLimitExceeded {
            retry_after: std::time::Duration::MAX,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], u64::MAX.to_string());
    }

    #[test]
    fn test_validation_envelope_shape() {
        let err = ApiError::from(DomainError::DuplicateEmail);
        let json = serde_json::to_value(&err.response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": {"email": "a user with this email address already exists"}})
        );
    }

    #[test]
    fn test_method_not_allowed_message() {
        let err = ApiError::method_not_allowed(&Method::PUT);
        assert_eq!(
            err.response.error,
            ErrorBody::Message("the PUT method is not supported for this resource".to_string())
        );
    }
}
