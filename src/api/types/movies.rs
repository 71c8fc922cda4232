//! Movie request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::{Metadata, Movie, NewMovie, Runtime};
use crate::infrastructure::movie::MovieUpdate;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMovieRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl From<CreateMovieRequest> for NewMovie {
    fn from(req: CreateMovieRequest) -> Self {
        NewMovie {
            title: req.title,
            year: req.year,
            runtime: req.runtime,
            genres: req.genres,
        }
    }
}

/// PATCH body; absent keys keep their stored value
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl From<UpdateMovieRequest> for MovieUpdate {
    fn from(req: UpdateMovieRequest) -> Self {
        MovieUpdate {
            title: req.title,
            year: req.year,
            runtime: req.runtime,
            genres: req.genres,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieEnvelope {
    pub movie: Movie,
}

#[derive(Debug, Serialize)]
pub struct MoviesEnvelope {
    pub movies: Vec<Movie>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}
