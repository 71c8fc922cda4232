//! Per-request access log
//!
//! `TraceLayer` already records the request line and latency. This adds what
//! only the gates know: whether the rate limiter admitted the request and who
//! the caller resolved to. Both are left on the response extensions by the
//! inner middleware.

use std::fmt;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::domain::{Identity, UserId};
use crate::infrastructure::Admission;

/// Caller a request resolved to, as recorded by the authenticate middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(UserId),
    /// The presented credential did not authenticate
    Rejected,
}

impl From<&Identity> for Caller {
    fn from(identity: &Identity) -> Self {
        identity.user().map_or(Self::Anonymous, |user| Self::User(user.id()))
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::User(id) => write!(f, "user:{}", id),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// `None` means the request never reached the authenticate middleware
fn caller_label(caller: Option<&Caller>) -> String {
    caller.map_or_else(|| "unresolved".to_string(), Caller::to_string)
}

/// `None` means the limiter is switched off
fn admission_label(admission: Option<&Admission>) -> &'static str {
    match admission {
        Some(Admission::Allowed) => "allowed",
        Some(Admission::Denied { .. }) => "denied",
        None => "bypassed",
    }
}

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    let caller = caller_label(response.extensions().get::<Caller>());
    let rate_limit = admission_label(response.extensions().get::<Admission>());

    if response.status().is_server_error() {
        warn!(%method, %path, status, duration_ms, %caller, rate_limit, "Request failed");
    } else {
        info!(%method, %path, status, duration_ms, %caller, rate_limit, "Request completed");
    }

    response
}
