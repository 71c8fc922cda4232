//! Version 1 API endpoints

pub mod movies;
pub mod tokens;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};

use super::health;
use super::state::AppState;

/// Create v1 API router
///
/// Paths are absolute so the routes can be merged, not nested, into the
/// top-level router.
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        .route(
            "/v1/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route(
            "/v1/movies/{id}",
            get(movies::show_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        )
        .route("/v1/users", post(users::register_user))
        .route("/v1/users/activated", put(users::activate_user))
        .route(
            "/v1/tokens/authentication",
            post(tokens::create_authentication_token),
        )
}
