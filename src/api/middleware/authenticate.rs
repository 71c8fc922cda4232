//! Bearer token authentication middleware

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::logging::Caller;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{DomainError, Identity, Scope};

/// Resolve the caller's [`Identity`] and store it in the request extensions
///
/// The response carries the resolved [`Caller`] for the access log.
///
/// No `Authorization` header means anonymous. A header that is not
/// `Bearer <token>`, or a token that does not authenticate, is a 401.
pub async fn authenticate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&state, request.headers()).await;

    let (mut response, caller) = match identity {
        Ok(identity) => {
            let caller = Caller::from(&identity);
            request.extensions_mut().insert(identity);
            (next.run(request).await, caller)
        }
        Err(err) => (err.into_response(), Caller::Rejected),
    };

    response.extensions_mut().insert(caller);
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn identify(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Identity::Anonymous);
    };

    let token = bearer_token(value).ok_or_else(ApiError::invalid_authentication_token)?;

    match state.authenticator.authenticate(token, Scope::Authentication).await {
        Ok(user) => {
            debug!(user_id = %user.id(), "Authenticated request");
            Ok(Identity::User(user))
        }
        Err(DomainError::InvalidCredential) => Err(ApiError::invalid_authentication_token()),
        Err(e) => Err(e.into()),
    }
}

/// Token from a `Bearer <token>` header value
pub fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let mut parts = value.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let value = HeaderValue::from_static("Bearer Y3QMGX3PJ3WLRL2YRTQGQ6KRHU");
        assert_eq!(bearer_token(&value), Some("Y3QMGX3PJ3WLRL2YRTQGQ6KRHU"));
    }

    #[test]
    fn test_bearer_token_rejects_other_forms() {
        for raw in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "bearer abc", "Bearer a b"] {
            assert_eq!(bearer_token(&HeaderValue::from_static(raw)), None, "{raw}");
        }
    }
}
