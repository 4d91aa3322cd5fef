use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, TrendingRepository};
use crate::models::{NewTrendingRecord, TrendingRecord};

/// Process-local trending collection. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTrendingRepository {
    records: RwLock<Vec<TrendingRecord>>,
}

impl MemoryTrendingRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_records(records: Vec<TrendingRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn records(&self) -> Vec<TrendingRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl TrendingRepository for MemoryTrendingRepository {
    async fn find_by_term(&self, term: &str) -> StoreResult<Vec<TrendingRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.search_term == term)
            .cloned()
            .collect())
    }

    async fn list_top(&self, limit: usize) -> StoreResult<Vec<TrendingRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.count.cmp(&a.count));
        records.truncate(limit);
        Ok(records)
    }

    async fn create(&self, record: NewTrendingRecord) -> StoreResult<TrendingRecord> {
        let record = record.into_record(uuid::Uuid::new_v4().simple().to_string());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<TrendingRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.count = count;
        Ok(record.clone())
    }
}
