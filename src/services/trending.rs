//! Trending store adapter.
//!
//! Counts how often a search term led to a selected movie. The counter update
//! is a lookup followed by a write with no conditional primitive in between,
//! so two concurrent first searches for a term may both create a record, and
//! concurrent repeats may lose an increment. Counts are best effort.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::constants::limits::TRENDING_LIMIT;
use crate::db::{StoreError, TrendingRepository};
use crate::models::{Movie, NewTrendingRecord, PosterUri, TrendingRecord};

#[derive(Debug, Error)]
pub enum TrendingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Trending store error: {0}")]
    Store(#[from] StoreError),
}

/// What `record_selection` did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Created { id: String },
    Incremented { id: String, count: i64 },
}

impl RecordOutcome {
    #[must_use]
    pub const fn count(&self) -> i64 {
        match self {
            Self::Created { .. } => 1,
            Self::Incremented { count, .. } => *count,
        }
    }
}

pub struct TrendingService {
    repository: Arc<dyn TrendingRepository>,
    posters: PosterUri,
}

impl TrendingService {
    #[must_use]
    pub fn new(repository: Arc<dyn TrendingRepository>, posters: PosterUri) -> Self {
        Self {
            repository,
            posters,
        }
    }

    /// Bumps the counter for `term`, creating it at 1 on first sight.
    pub async fn record_selection(
        &self,
        term: &str,
        movie: &Movie,
    ) -> Result<RecordOutcome, TrendingError> {
        if term.is_empty() {
            return Err(TrendingError::Validation(
                "search term must not be empty".to_string(),
            ));
        }

        if movie.id <= 0 {
            return Err(TrendingError::Validation(format!(
                "movie id must be positive, got {}",
                movie.id
            )));
        }

        let existing = self.repository.find_by_term(term).await?;

        let outcome = if let Some(record) = existing.into_iter().next() {
            let count = record.count + 1;
            self.repository.update_count(&record.id, count).await?;
            RecordOutcome::Incremented {
                id: record.id,
                count,
            }
        } else {
            let record = self
                .repository
                .create(NewTrendingRecord {
                    search_term: term.to_string(),
                    count: 1,
                    movie_id: movie.id,
                    poster_uri: self.posters.resolve(movie.poster_path.as_deref()),
                })
                .await?;
            RecordOutcome::Created { id: record.id }
        };

        info!(
            term,
            movie_id = movie.id,
            count = outcome.count(),
            "Recorded trending search"
        );
        Ok(outcome)
    }

    /// The leaderboard, or the store failure that prevented reading it.
    pub async fn fetch_top_trending(&self) -> Result<Vec<TrendingRecord>, TrendingError> {
        let mut records = self.repository.list_top(TRENDING_LIMIT).await?;

        records.sort_by(|a, b| b.count.cmp(&a.count));
        records.truncate(TRENDING_LIMIT);

        debug!(count = records.len(), "Loaded trending records");
        Ok(records)
    }

    /// The leaderboard, empty when the store cannot be read.
    pub async fn top_trending(&self) -> Vec<TrendingRecord> {
        self.fetch_top_trending().await.unwrap_or_else(|e| {
            error!("Error getting trending movies: {}", e);
            Vec::new()
        })
    }
}
