//! Per-client rate limiting middleware

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::Admission;

/// Admit the request against its client's bucket, or answer 429
///
/// Clients are keyed by peer IP address, so the server has to be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`. The [`Admission`] is
/// left on the response for the access log.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.rate_limiter.config().enabled {
        return next.run(request).await;
    }

    let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        return ApiError::internal("client address unavailable for rate limiting").into_response();
    };

    let admission = state.rate_limiter.admit(&addr.ip().to_string()).await;
    let mut response = match admission.into_result() {
        Ok(()) => next.run(request).await,
        Err(err) => ApiError::from(err).into_response(),
    };

    response.extensions_mut().insert(admission);
    response
}
