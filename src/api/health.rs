//! Health check endpoint

use axum::extract::State;
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: &'static str,
}

/// `GET /v1/healthcheck`
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available",
        system_info: SystemInfo {
            environment: state.config.server.env.clone(),
            version: VERSION,
        },
    })
}
