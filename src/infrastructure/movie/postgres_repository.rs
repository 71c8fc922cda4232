//! PostgreSQL movie repository

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{
    DomainError, Metadata, Movie, MovieId, MovieQuery, MovieRepository, NewMovie, Runtime,
};
use crate::infrastructure::storage::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresMovieRepository {
    pool: PgPool,
}

impl PostgresMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PostgresMovieRepository {
    async fn insert(&self, movie: NewMovie) -> Result<Movie, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, title, year, runtime, genres, version
            "#,
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime.0)
        .bind(&movie.genres)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert movie", e))?;

        row_to_movie(&row)
    }

    async fn get(&self, id: MovieId) -> Result<Option<Movie>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get movie", e))?;

        row.as_ref().map(row_to_movie).transpose()
    }

    async fn update(&self, movie: &Movie, expected: i32) -> Result<Option<i32>, DomainError> {
        sqlx::query_scalar(
            r#"
            UPDATE movies
            SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime.0)
        .bind(&movie.genres)
        .bind(movie.id.as_i64())
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update movie", e))
    }

    async fn delete(&self, id: MovieId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete movie", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, Metadata), DomainError> {
        let filters = &query.filters;
        // Only safelisted names reach the ORDER BY clause
        let column = filters
            .sort_column()
            .ok_or_else(|| DomainError::invariant(format!("unsafe sort parameter: {}", filters.sort)))?;

        let sql = format!(
            r#"
            SELECT count(*) OVER(), id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
            AND (genres @> $2 OR $2 = '{{}}')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            column,
            filters.sort_direction().as_sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&query.title)
            .bind(&query.genres)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list movies", e))?;

        let mut total_records = 0_i64;
        let mut movies = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row
                .try_get(0)
                .map_err(|e| map_sqlx_error("Failed to decode movie count", e))?;
            movies.push(row_to_movie(row)?);
        }

        Ok((
            movies,
            Metadata::calculate(total_records, filters.page, filters.page_size),
        ))
    }
}

fn row_to_movie(row: &PgRow) -> Result<Movie, DomainError> {
    let read = |e| map_sqlx_error("Failed to decode movie row", e);

    Ok(Movie {
        id: MovieId::new(row.try_get("id").map_err(read)?),
        created_at: row.try_get("created_at").map_err(read)?,
        title: row.try_get("title").map_err(read)?,
        year: row.try_get("year").map_err(read)?,
        runtime: Runtime(row.try_get("runtime").map_err(read)?),
        genres: row.try_get("genres").map_err(read)?,
        version: row.try_get("version").map_err(read)?,
    })
}
