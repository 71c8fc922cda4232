//! Movie domain
//!
//! Movies are the catalog's versioned resource: every update is a
//! compare-and-swap on the version counter.

mod entity;
mod repository;
mod validation;

pub use entity::{Movie, MovieId, NewMovie, Runtime, RuntimeFormatError};
pub use repository::{MovieQuery, MovieRepository, MOVIE_SORT_SAFELIST};
pub use validation::validate_movie;

#[cfg(test)]
pub use repository::MockMovieRepository;
