//! Persistence for trending records.
//!
//! The trending collection lives in an external document store; this module
//! describes the four document operations the application consumes and hosts
//! the backends that provide them.

pub mod appwrite;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::clients::appwrite::AppwriteError;
use crate::models::{NewTrendingRecord, TrendingRecord};

pub use appwrite::AppwriteTrendingRepository;
pub use memory::MemoryTrendingRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Appwrite(#[from] AppwriteError),

    #[error("document {0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document operations over the trending collection.
///
/// No method is atomic with respect to another; callers combining a lookup
/// with a write accept lost updates under concurrent writers.
#[async_trait]
pub trait TrendingRepository: Send + Sync {
    /// Records whose search term equals `term` exactly.
    async fn find_by_term(&self, term: &str) -> StoreResult<Vec<TrendingRecord>>;

    /// Up to `limit` records ordered by count, highest first.
    async fn list_top(&self, limit: usize) -> StoreResult<Vec<TrendingRecord>>;

    async fn create(&self, record: NewTrendingRecord) -> StoreResult<TrendingRecord>;

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<TrendingRecord>;
}
