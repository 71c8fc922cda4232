//! Movie repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::{Movie, MovieId, NewMovie};
use crate::domain::concurrency::ConditionalUpdate;
use crate::domain::filters::{Filters, Metadata};
use crate::domain::DomainError;

pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// List query: optional title words, required genres and paging
#[derive(Debug, Clone)]
pub struct MovieQuery {
    /// Every word must appear in the title; empty matches all
    pub title: String,
    /// Every genre must be present; empty matches all
    pub genres: Vec<String>,
    pub filters: Filters,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MovieRepository: Send + Sync + Debug {
    /// Insert with version 1 and return the stored movie
    async fn insert(&self, movie: NewMovie) -> Result<Movie, DomainError>;

    async fn get(&self, id: MovieId) -> Result<Option<Movie>, DomainError>;

    /// Write `movie` if the stored version still equals `expected`
    async fn update(&self, movie: &Movie, expected: i32) -> Result<Option<i32>, DomainError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: MovieId) -> Result<bool, DomainError>;

    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, Metadata), DomainError>;
}

#[async_trait]
impl<R: MovieRepository + ?Sized> ConditionalUpdate<Movie> for R {
    async fn update_if_version(&self, movie: &Movie, expected: i32) -> Result<Option<i32>, DomainError> {
        self.update(movie, expected).await
    }
}
