use std::any::Any;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::middleware::{authenticate_middleware, logging_middleware, rate_limit_middleware};
use super::state::AppState;
use super::types::ApiError;
use super::v1;
use crate::config::CorsConfig;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    with_middleware(v1::create_v1_router(), state)
}

/// Wrap `routes` in the fallbacks and middleware stack
///
/// From the outside in: panic recovery, request ids, tracing, request
/// logging, CORS, rate limiting, authentication.
pub fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    routes
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(&method)
}

/// 500 in the error envelope; the connection is not reused
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let mut response = ApiError::internal(format!("handler panicked: {}", detail)).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .trusted_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid trusted origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(AnyOrigin)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-expected-version"),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::middleware::{Caller, RequireActivated, RequireAuthenticated};
    use crate::config::AppConfig;
    use crate::domain::permission::MOVIES_WRITE;
    use crate::domain::{ManualClock, UserId};
    use crate::infrastructure::mailer::tests::RecordingMailer;
    use crate::infrastructure::Admission;
    use crate::infrastructure::storage::{InMemoryStore, Repositories};

    struct Harness {
        state: AppState,
        repos: Repositories,
        mailer: RecordingMailer,
    }

    fn harness_with(config: AppConfig) -> Harness {
        let clock = Arc::new(ManualClock::default());
        let repos = Repositories::in_memory(InMemoryStore::new(clock.clone()));
        let mailer = RecordingMailer::default();
        let state = AppState::with_mailer(config, repos.clone(), clock, Arc::new(mailer.clone()));

        Harness { state, repos, mailer }
    }

    fn harness() -> Harness {
        let mut config = AppConfig::default();
        config.limiter.enabled = false;
        harness_with(config)
    }

    fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let mut req = builder.body(body).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50000))));
        req
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    /// Register, activate and log in; returns the user id and bearer token
    async fn activated_user(h: &Harness, email: &str) -> (UserId, String) {
        let (status, _, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/users",
                Some(json!({"name": "Alice", "email": email, "password": "pa55word"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let user_id = UserId::new(body["user"]["id"].as_i64().unwrap());

        h.state.background.wait().await;
        let activation = {
            let sent = h.mailer.sent.lock().await;
            let (_, _, data) = sent.last().unwrap();
            data["activationToken"].as_str().unwrap().to_string()
        };

        let (status, _, body) = send(
            &h.state,
            request(
                Method::PUT,
                "/v1/users/activated",
                Some(json!({"token": activation})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["activated"], true);

        let (status, _, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/tokens/authentication",
                Some(json!({"email": email, "password": "pa55word"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["authentication_token"]["token"].as_str().unwrap().to_string();

        (user_id, token)
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let h = harness();
        let (status, headers, body) = send(&h.state, request(Method::GET, "/v1/healthcheck", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "available");
        assert_eq!(body["system_info"]["environment"], "development");
        assert_eq!(headers[header::VARY], "Authorization");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_enveloped_404() {
        let h = harness();
        let (status, _, body) = send(&h.state, request(Method::GET, "/v1/nothing", None, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "the requested resource could not be found"}));
    }

    #[tokio::test]
    async fn test_wrong_method_is_enveloped_405() {
        let h = harness();
        let (status, _, body) = send(&h.state, request(Method::DELETE, "/v1/healthcheck", None, None)).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body,
            json!({"error": "the DELETE method is not supported for this resource"})
        );
    }

    #[tokio::test]
    async fn test_malformed_authorization_header() {
        let h = harness();
        let mut req = request(Method::GET, "/v1/healthcheck", None, None);
        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));

        let (status, headers, body) = send(&h.state, req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(headers[header::VARY], "Authorization");
        assert_eq!(body["error"], "invalid or missing authentication token");
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let h = harness();
        let (status, _, _) = send(
            &h.state,
            request(Method::GET, "/v1/healthcheck", None, Some("AAAAAAAAAAAAAAAAAAAAAAAAAA")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_list_movies() {
        let h = harness();
        let (status, _, body) = send(&h.state, request(Method::GET, "/v1/movies", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "you must be authenticated to access this resource");
    }

    /// Register without activating and log in; returns the bearer token
    async fn inactive_user(h: &Harness, email: &str) -> String {
        send(
            &h.state,
            request(
                Method::POST,
                "/v1/users",
                Some(json!({"name": "Bob", "email": email, "password": "pa55word"})),
                None,
            ),
        )
        .await;

        let (status, _, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/tokens/authentication",
                Some(json!({"email": email, "password": "pa55word"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["authentication_token"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_inactive_account_is_forbidden() {
        let h = harness();
        let token = inactive_user(&h, "bob@example.com").await;

        let (status, _, body) = send(&h.state, request(Method::GET, "/v1/movies", None, Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "your user account must be activated to access this resource"
        );
    }

    async fn whoami(RequireAuthenticated(user): RequireAuthenticated) -> String {
        user.id().to_string()
    }

    async fn activated_only(RequireActivated(user): RequireActivated) -> String {
        user.id().to_string()
    }

    async fn call(h: &Harness, uri: &str, token: Option<&str>) -> (StatusCode, String) {
        let routes = Router::new()
            .route("/whoami", get(whoami))
            .route("/activated", get(activated_only));
        let response = with_middleware(routes, h.state.clone())
            .oneshot(request(Method::GET, uri, None, token))
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_require_authenticated_admits_inactive_users() {
        let h = harness();
        let token = inactive_user(&h, "grace@example.com").await;

        let (status, body) = call(&h, "/whoami", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("you must be authenticated"));

        let (status, body) = call(&h, "/whoami", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_require_activated() {
        let h = harness();
        let inactive = inactive_user(&h, "heidi@example.com").await;
        let (user_id, active) = activated_user(&h, "ivan@example.com").await;

        let (status, _) = call(&h, "/activated", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&h, "/activated", Some(&inactive)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("must be activated"));

        let (status, body) = call(&h, "/activated", Some(&active)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let h = harness();
        activated_user(&h, "carol@example.com").await;

        let (status, headers, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/tokens/authentication",
                Some(json!({"email": "carol@example.com", "password": "wrong-password"})),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(body["error"], "invalid authentication credentials");
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let h = harness();
        activated_user(&h, "dave@example.com").await;

        let (status, _, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/users",
                Some(json!({"name": "Dave", "email": "dave@example.com", "password": "pa55word"})),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"error": {"email": "a user with this email address already exists"}})
        );
    }

    #[tokio::test]
    async fn test_unknown_body_field() {
        let h = harness();
        let (status, _, body) = send(
            &h.state,
            request(
                Method::POST,
                "/v1/users",
                Some(json!({"name": "Eve", "email": "eve@example.com", "password": "pa55word", "admin": true})),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "body contains unknown key \"admin\"");
    }

    #[tokio::test]
    async fn test_movie_lifecycle() {
        let h = harness();
        let (user_id, token) = activated_user(&h, "frank@example.com").await;

        let movie = json!({"title": "Moana", "year": 2016, "runtime": "107 mins", "genres": ["animation", "adventure"]});

        // movies:read only
        let (status, _, body) = send(
            &h.state,
            request(Method::POST, "/v1/movies", Some(movie.clone()), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "your user account doesn't have the necessary permissions to access this resource"
        );

        h.repos
            .permissions
            .add_for_user(user_id, vec![MOVIES_WRITE.to_string()])
            .await
            .unwrap();

        let (status, headers, body) = send(
            &h.state,
            request(Method::POST, "/v1/movies", Some(movie), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::LOCATION], "/v1/movies/1");
        assert_eq!(body["movie"]["runtime"], "107 mins");
        assert_eq!(body["movie"]["version"], 1);

        let (status, _, body) = send(&h.state, request(Method::GET, "/v1/movies/1", None, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movie"]["title"], "Moana");

        let (status, _, body) = send(
            &h.state,
            request(Method::PATCH, "/v1/movies/1", Some(json!({"year": 2017})), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movie"]["year"], 2017);
        assert_eq!(body["movie"]["version"], 2);

        let mut stale = request(Method::PATCH, "/v1/movies/1", Some(json!({"year": 2018})), Some(&token));
        stale
            .headers_mut()
            .insert("x-expected-version", HeaderValue::from_static("1"));
        let (status, _, body) = send(&h.state, stale).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"],
            "unable to update the record due to an edit conflict, please try again"
        );

        let (status, _, body) = send(
            &h.state,
            request(Method::GET, "/v1/movies?title=moana&sort=-year", None, Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movies"].as_array().unwrap().len(), 1);
        assert_eq!(body["metadata"]["total_records"], 1);

        let (status, _, body) = send(
            &h.state,
            request(Method::GET, "/v1/movies?sort=rating", None, Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["sort"], "invalid sort value");

        let (status, _, body) = send(&h.state, request(Method::DELETE, "/v1/movies/1", None, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "movie successfully deleted");

        let (status, _, _) = send(&h.state, request(Method::GET, "/v1/movies/1", None, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&h.state, request(Method::GET, "/v1/movies/abc", None, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limit_per_client() {
        let mut config = AppConfig::default();
        config.limiter.enabled = true;
        config.limiter.rps = 1.0;
        config.limiter.burst = 1;
        let h = harness_with(config);

        let (status, _, _) = send(&h.state, request(Method::GET, "/v1/healthcheck", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, headers, body) = send(&h.state, request(Method::GET, "/v1/healthcheck", None, None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers[header::RETRY_AFTER], "1");
        assert_eq!(body["error"], "rate limit exceeded");

        let mut other = request(Method::GET, "/v1/healthcheck", None, None);
        other
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 50000))));
        let (status, _, _) = send(&h.state, other).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_outcomes_are_left_for_access_log() {
        let mut config = AppConfig::default();
        config.limiter.burst = 6;
        let h = harness_with(config);
        let (user_id, token) = activated_user(&h, "judy@example.com").await;

        let response = create_router(h.state.clone())
            .oneshot(request(Method::GET, "/v1/healthcheck", None, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.extensions().get::<Caller>(), Some(&Caller::User(user_id)));
        assert_eq!(response.extensions().get::<Admission>(), Some(&Admission::Allowed));

        let response = create_router(h.state.clone())
            .oneshot(request(Method::GET, "/v1/healthcheck", None, Some("AAAAAAAAAAAAAAAAAAAAAAAAAA")))
            .await
            .unwrap();
        assert_eq!(response.extensions().get::<Caller>(), Some(&Caller::Rejected));

        // Three calls set up the user; this sixth one spends the last permit
        let response = create_router(h.state.clone())
            .oneshot(request(Method::GET, "/v1/healthcheck", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = create_router(h.state.clone())
            .oneshot(request(Method::GET, "/v1/healthcheck", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(
            response.extensions().get::<Admission>(),
            Some(Admission::Denied { .. })
        ));
        assert!(response.extensions().get::<Caller>().is_none());
    }

    #[tokio::test]
    async fn test_missing_client_address_is_server_error() {
        let h = harness_with(AppConfig::default());
        let req = Request::builder()
            .uri("/v1/healthcheck")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = send(&h.state, req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "the server encountered a problem and couldn't process your request"
        );
    }

    #[tokio::test]
    async fn test_panic_is_recovered() {
        let h = harness();
        async fn boom() -> &'static str {
            panic!("boom")
        }

        let routes = Router::new().route("/boom", get(boom));
        let app = with_middleware(routes, h.state.clone());

        let response = app
            .oneshot(request(Method::GET, "/boom", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }
}
