use async_trait::async_trait;
use serde::Serialize;

use super::{StoreResult, TrendingRepository};
use crate::clients::appwrite::{AppwriteClient, Query};
use crate::models::{NewTrendingRecord, TrendingRecord};

const SEARCH_TERM: &str = "searchTerm";
const COUNT: &str = "count";

#[derive(Serialize)]
struct CountPatch {
    count: i64,
}

pub struct AppwriteTrendingRepository {
    client: AppwriteClient,
}

impl AppwriteTrendingRepository {
    #[must_use]
    pub const fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrendingRepository for AppwriteTrendingRepository {
    async fn find_by_term(&self, term: &str) -> StoreResult<Vec<TrendingRecord>> {
        let list = self
            .client
            .list_documents(&[Query::equal(SEARCH_TERM, term)])
            .await?;
        Ok(list.documents)
    }

    async fn list_top(&self, limit: usize) -> StoreResult<Vec<TrendingRecord>> {
        let list = self
            .client
            .list_documents(&[Query::order_desc(COUNT), Query::limit(limit)])
            .await?;
        Ok(list.documents)
    }

    async fn create(&self, record: NewTrendingRecord) -> StoreResult<TrendingRecord> {
        let id = AppwriteClient::unique_id();
        Ok(self.client.create_document(&id, &record).await?)
    }

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<TrendingRecord> {
        Ok(self
            .client
            .update_document(id, &CountPatch { count })
            .await?)
    }
}
