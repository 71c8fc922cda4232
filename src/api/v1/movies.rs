//! Movie catalog endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};

use crate::api::middleware::{MoviesRead, MoviesWrite, RequirePermission};
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CreateMovieRequest, Json, MessageEnvelope, MovieEnvelope, MoviesEnvelope,
    UpdateMovieRequest,
};
use crate::domain::movie::MOVIE_SORT_SAFELIST;
use crate::domain::{Filters, MovieId, MovieQuery, Validator};

pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Parse a `{id}` path segment; anything but a positive integer is a 404
pub fn parse_id(raw: &str) -> Result<MovieId, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(MovieId::new(id)),
        _ => Err(ApiError::not_found()),
    }
}

/// POST /v1/movies
pub async fn create_movie(
    State(state): State<AppState>,
    _auth: RequirePermission<MoviesWrite>,
    Json(body): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state.movie_service.create(body.into()).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/v1/movies/{}", movie.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(MovieEnvelope { movie })))
}

/// GET /v1/movies/{id}
pub async fn show_movie(
    State(state): State<AppState>,
    _auth: RequirePermission<MoviesRead>,
    Path(id): Path<String>,
) -> Result<Json<MovieEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let movie = state.movie_service.get(id).await?;

    Ok(Json(MovieEnvelope { movie }))
}

/// PATCH /v1/movies/{id}
///
/// An `X-Expected-Version` header that does not match the stored version is
/// an edit conflict.
pub async fn update_movie(
    State(state): State<AppState>,
    _auth: RequirePermission<MoviesWrite>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateMovieRequest>,
) -> Result<Json<MovieEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let expected_version = expected_version(&headers)?;

    let movie = state
        .movie_service
        .update(id, body.into(), expected_version)
        .await?;

    Ok(Json(MovieEnvelope { movie }))
}

/// DELETE /v1/movies/{id}
pub async fn delete_movie(
    State(state): State<AppState>,
    _auth: RequirePermission<MoviesWrite>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    state.movie_service.delete(id).await?;

    Ok(Json(MessageEnvelope {
        message: "movie successfully deleted".to_string(),
    }))
}

/// GET /v1/movies
pub async fn list_movies(
    State(state): State<AppState>,
    _auth: RequirePermission<MoviesRead>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<MoviesEnvelope>, ApiError> {
    let query = parse_list_query(&params)?;
    let (movies, metadata) = state.movie_service.list(query).await?;

    Ok(Json(MoviesEnvelope { movies, metadata }))
}

/// Header value that cannot be parsed can never match, so it conflicts
fn expected_version(headers: &HeaderMap) -> Result<Option<i32>, ApiError> {
    match headers.get(EXPECTED_VERSION_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(Some)
            .ok_or_else(ApiError::edit_conflict),
    }
}

/// Build a list query from `title`, `genres`, `page`, `page_size` and `sort`
pub fn parse_list_query(params: &HashMap<String, String>) -> Result<MovieQuery, ApiError> {
    let mut v = Validator::new();

    let title = params.get("title").cloned().unwrap_or_default();
    let genres = params
        .get("genres")
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let page = read_int(params, "page", 1, &mut v);
    let page_size = read_int(params, "page_size", 20, &mut v);
    let sort = params
        .get("sort")
        .cloned()
        .unwrap_or_else(|| "id".to_string());

    if !v.is_valid() {
        return Err(ApiError::failed_validation(v.errors().clone()));
    }

    Ok(MovieQuery {
        title,
        genres,
        filters: Filters {
            page,
            page_size,
            sort,
            sort_safelist: MOVIE_SORT_SAFELIST,
        },
    })
}

fn read_int(params: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match params.get(key).map(String::as_str) {
        None | Some("") => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}
