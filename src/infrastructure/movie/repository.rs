//! In-memory movie repository

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::domain::{
    DomainError, Metadata, Movie, MovieId, MovieQuery, MovieRepository, NewMovie, SortDirection,
};
use crate::infrastructure::storage::InMemoryStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryMovieRepository {
    store: InMemoryStore,
}

impl InMemoryMovieRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

/// Lowercased alphanumeric words, the way a `simple` text search config
/// tokenizes
fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn matches_query(movie: &Movie, query: &MovieQuery, title_words: &[String]) -> bool {
    let title_ok = title_words.is_empty() || {
        let have = words(&movie.title);
        title_words.iter().all(|w| have.contains(w))
    };
    let genres_ok = query.genres.iter().all(|g| movie.genres.contains(g));

    title_ok && genres_ok
}

fn compare(a: &Movie, b: &Movie, column: &str) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn insert(&self, movie: NewMovie) -> Result<Movie, DomainError> {
        let created_at = self.store.now();
        let mut tables = self.store.write().await;
        let id = tables.allocate_movie_id();

        let stored = Movie {
            id: MovieId::new(id),
            created_at,
            title: movie.title,
            year: movie.year,
            runtime: movie.runtime,
            genres: movie.genres,
            version: 1,
        };
        tables.movies.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get(&self, id: MovieId) -> Result<Option<Movie>, DomainError> {
        Ok(self.store.read().await.movies.get(&id.as_i64()).cloned())
    }

    async fn update(&self, movie: &Movie, expected: i32) -> Result<Option<i32>, DomainError> {
        let mut tables = self.store.write().await;

        let Some(stored) = tables.movies.get_mut(&movie.id.as_i64()) else {
            return Ok(None);
        };
        if stored.version != expected {
            return Ok(None);
        }

        let new_version = expected + 1;
        *stored = Movie {
            created_at: stored.created_at,
            version: new_version,
            ..movie.clone()
        };

        Ok(Some(new_version))
    }

    async fn delete(&self, id: MovieId) -> Result<bool, DomainError> {
        Ok(self.store.write().await.movies.remove(&id.as_i64()).is_some())
    }

    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, Metadata), DomainError> {
        let filters = &query.filters;
        let column = filters
            .sort_column()
            .ok_or_else(|| DomainError::invariant(format!("unsafe sort parameter: {}", filters.sort)))?;
        let direction = filters.sort_direction();
        let title_words = words(&query.title);

        let tables = self.store.read().await;
        let mut found: Vec<Movie> = tables
            .movies
            .values()
            .filter(|m| matches_query(m, query, &title_words))
            .cloned()
            .collect();
        drop(tables);

        found.sort_by(|a, b| {
            let primary = match direction {
                SortDirection::Asc => compare(a, b, column),
                SortDirection::Desc => compare(b, a, column),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = found.len() as i64;
        let page: Vec<Movie> = found
            .into_iter()
            .skip(filters.offset().max(0) as usize)
            .take(filters.limit().max(0) as usize)
            .collect();

        Ok((page, Metadata::calculate(total, filters.page, filters.page_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::movie::MOVIE_SORT_SAFELIST;
    use crate::domain::{Filters, Runtime};

    async fn seeded() -> InMemoryMovieRepository {
        let repo = InMemoryMovieRepository::default();
        for (title, year, runtime, genres) in [
            ("Moana", 2016, 107, vec!["animation", "adventure"]),
            ("Black Panther", 2018, 134, vec!["action", "adventure"]),
            ("Deadpool", 2016, 108, vec!["action", "comedy"]),
            ("The Breakfast Club", 1985, 96, vec!["drama"]),
        ] {
            repo.insert(NewMovie {
                title: title.into(),
                year,
                runtime: Runtime(runtime),
                genres: genres.into_iter().map(String::from).collect(),
            })
            .await
            .unwrap();
        }
        repo
    }

    fn query(title: &str, genres: &[&str], page: i64, page_size: i64, sort: &str) -> MovieQuery {
        MovieQuery {
            title: title.into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            filters: Filters {
                page,
                page_size,
                sort: sort.into(),
                sort_safelist: MOVIE_SORT_SAFELIST,
            },
        }
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_title_search_matches_words() {
        let repo = seeded().await;
        let (movies, _) = repo.list(&query("breakfast CLUB", &[], 1, 20, "id")).await.unwrap();
        assert_eq!(titles(&movies), vec!["The Breakfast Club"]);

        let (movies, _) = repo.list(&query("break", &[], 1, 20, "id")).await.unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_genres_must_all_match() {
        let repo = seeded().await;
        let (movies, meta) = repo
            .list(&query("", &["action", "adventure"], 1, 20, "id"))
            .await
            .unwrap();

        assert_eq!(titles(&movies), vec!["Black Panther"]);
        assert_eq!(meta.total_records, 1);
    }

    #[tokio::test]
    async fn test_sort_desc_with_id_tiebreak() {
        let repo = seeded().await;
        let (movies, _) = repo.list(&query("", &[], 1, 20, "-year")).await.unwrap();

        assert_eq!(
            titles(&movies),
            vec!["Black Panther", "Moana", "Deadpool", "The Breakfast Club"]
        );
    }

    #[tokio::test]
    async fn test_pagination() {
        let repo = seeded().await;
        let (movies, meta) = repo.list(&query("", &[], 2, 3, "title")).await.unwrap();

        assert_eq!(titles(&movies), vec!["The Breakfast Club"]);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.last_page, 2);
        assert_eq!(meta.total_records, 4);
    }

    #[tokio::test]
    async fn test_unsafe_sort_is_rejected() {
        let repo = seeded().await;
        let result = repo.list(&query("", &[], 1, 20, "created_at")).await;
        assert!(matches!(result, Err(DomainError::InvariantViolation { .. })));
    }
}
