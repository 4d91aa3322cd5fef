use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::clients::tmdb::{MovieQuery, TmdbClient, TmdbError};
use crate::constants::messages;
use crate::models::Movie;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("movie lookup failed: {0}")]
    Fetch(#[from] TmdbError),

    #[error("no movies matched")]
    NoResults,
}

impl SearchError {
    /// The text shown in place of the result list.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch(_) => messages::FETCH_MOVIES_FAILED,
            Self::NoResults => messages::NO_MOVIES_FOUND,
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "error",
            Self::NoResults => "empty",
        }
    }
}

/// Source of movie listings.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn list(&self, query: MovieQuery<'_>) -> Result<Vec<Movie>, TmdbError>;
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn list(&self, query: MovieQuery<'_>) -> Result<Vec<Movie>, TmdbError> {
        Ok(self.fetch(&query).await?.results)
    }
}

#[derive(Clone)]
pub struct SearchService {
    catalog: Arc<dyn MovieCatalog>,
}

impl SearchService {
    #[must_use]
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self { catalog }
    }

    /// Popular movies for an empty term, matches for anything else, in the
    /// order the catalog returned them.
    pub async fn search(&self, term: &str) -> Result<Vec<Movie>, SearchError> {
        let query = MovieQuery::for_term(term);
        let movies = self.catalog.list(query).await?;

        debug!(term, results = movies.len(), "Movie lookup finished");

        if movies.is_empty() {
            return Err(SearchError::NoResults);
        }

        Ok(movies)
    }
}
