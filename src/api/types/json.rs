//! JSON extractor with a body size cap and descriptive rejections

use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use super::error::ApiError;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON body extractor and response wrapper
///
/// Request bodies are capped at [`MAX_BODY_BYTES`], must hold exactly one
/// JSON value, and fail with a 400 naming the problem. Request types pair it
/// with `#[serde(deny_unknown_fields)]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// JSON rejection rendered in the error envelope
#[derive(Debug)]
pub struct JsonRejection {
    message: String,
}

impl JsonRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        ApiError::bad_request(self.message).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| {
                JsonRejection::new(format!(
                    "body must not be larger than {} bytes",
                    MAX_BODY_BYTES
                ))
            })?;

        decode(&bytes).map(Json)
    }
}

/// Decode exactly one JSON value from `bytes`
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, JsonRejection> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(JsonRejection::new("body must not be empty"));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(|e| JsonRejection::new(describe(&e)))?;

    de.end()
        .map_err(|_| JsonRejection::new("body must only contain a single JSON value"))?;

    Ok(value)
}

fn describe(err: &serde_json::Error) -> String {
    match err.classify() {
        Category::Syntax => format!(
            "body contains badly-formed JSON (at line {}, column {})",
            err.line(),
            err.column()
        ),
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Io => "unable to read request body".to_string(),
        Category::Data => {
            let text = err.to_string();
            let message = text.split(" at line ").next().unwrap_or(&text);

            if let Some(rest) = message.strip_prefix("unknown field `") {
                let field = rest.split('`').next().unwrap_or(rest);
                format!("body contains unknown key \"{}\"", field)
            } else if message.starts_with("invalid type") {
                format!(
                    "body contains incorrect JSON type (at line {}, column {})",
                    err.line(),
                    err.column()
                )
            } else {
                message.to_string()
            }
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}
