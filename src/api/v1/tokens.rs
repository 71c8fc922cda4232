//! Authentication token endpoint

use axum::{extract::State, http::StatusCode};

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, AuthenticationTokenEnvelope, CreateAuthenticationTokenBody, Json,
};
use crate::domain::DomainError;

/// POST /v1/tokens/authentication
pub async fn create_authentication_token(
    State(state): State<AppState>,
    Json(body): Json<CreateAuthenticationTokenBody>,
) -> Result<(StatusCode, Json<AuthenticationTokenEnvelope>), ApiError> {
    let token = state
        .user_service
        .login(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            DomainError::InvalidCredential => ApiError::invalid_credentials(),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticationTokenEnvelope {
            authentication_token: token,
        }),
    ))
}
