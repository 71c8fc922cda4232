//! Movie catalog operations

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::filters::validate_filters;
use crate::domain::movie::validate_movie;
use crate::domain::{
    DomainError, Metadata, Movie, MovieId, MovieQuery, MovieRepository, NewMovie, Runtime,
    Validator,
};
use crate::infrastructure::concurrency::ConcurrencyGuard;
use crate::infrastructure::storage::{with_deadline, DEFAULT_STORE_TIMEOUT};

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
    guard: ConcurrencyGuard,
    store_timeout: Duration,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>, guard: ConcurrencyGuard) -> Self {
        Self {
            movies,
            guard,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn create(&self, movie: NewMovie) -> Result<Movie, DomainError> {
        let mut v = Validator::new();
        validate_movie(&mut v, &movie);
        v.into_result()?;

        let movie = with_deadline(self.store_timeout, "insert_movie", self.movies.insert(movie)).await?;

        info!(movie_id = %movie.id, "Created movie");
        Ok(movie)
    }

    pub async fn get(&self, id: MovieId) -> Result<Movie, DomainError> {
        with_deadline(self.store_timeout, "get_movie", self.movies.get(id))
            .await?
            .ok_or_else(|| DomainError::not_found(format!("movie {}", id)))
    }

    /// Apply `changes` to the stored movie
    ///
    /// With `expected_version` set, a stored version that differs fails with
    /// `EditConflict` before anything is written. The write itself is always
    /// version-checked.
    pub async fn update(
        &self,
        id: MovieId,
        changes: MovieUpdate,
        expected_version: Option<i32>,
    ) -> Result<Movie, DomainError> {
        let mut movie = self.get(id).await?;

        if let Some(expected) = expected_version {
            if expected != movie.version {
                return Err(DomainError::EditConflict);
            }
        }

        if let Some(title) = changes.title {
            movie.title = title;
        }
        if let Some(year) = changes.year {
            movie.year = year;
        }
        if let Some(runtime) = changes.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = changes.genres {
            movie.genres = genres;
        }

        let mut v = Validator::new();
        validate_movie(
            &mut v,
            &NewMovie {
                title: movie.title.clone(),
                year: movie.year,
                runtime: movie.runtime,
                genres: movie.genres.clone(),
            },
        );
        v.into_result()?;

        let read_version = movie.version;
        self.guard
            .commit_if_version_matches(&*self.movies, &mut movie, read_version)
            .await?;

        info!(movie_id = %movie.id, version = movie.version, "Updated movie");
        Ok(movie)
    }

    pub async fn delete(&self, id: MovieId) -> Result<(), DomainError> {
        let deleted = with_deadline(self.store_timeout, "delete_movie", self.movies.delete(id)).await?;

        if !deleted {
            return Err(DomainError::not_found(format!("movie {}", id)));
        }

        info!(movie_id = %id, "Deleted movie");
        Ok(())
    }

    pub async fn list(&self, query: MovieQuery) -> Result<(Vec<Movie>, Metadata), DomainError> {
        let mut v = Validator::new();
        validate_filters(&mut v, &query.filters);
        v.into_result()?;

        with_deadline(self.store_timeout, "list_movies", self.movies.list(&query)).await
    }
}
