//! Account registration and activation endpoints

use axum::{extract::State, http::StatusCode};

use crate::api::state::AppState;
use crate::api::types::{ActivateUserBody, ApiError, Json, RegisterUserBody, UserEnvelope};

/// POST /v1/users
///
/// Answers 202: the activation mail is sent after the response.
pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserBody>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let user = state.user_service.register(body.into()).await?;

    Ok((StatusCode::ACCEPTED, Json(UserEnvelope { user })))
}

/// PUT /v1/users/activated
pub async fn activate_user(
    State(state): State<AppState>,
    Json(body): Json<ActivateUserBody>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.user_service.activate(&body.token).await?;

    Ok(Json(UserEnvelope { user }))
}
