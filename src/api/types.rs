use serde::{Deserialize, Serialize};

use crate::models::{Movie, TrendingRecord};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct InputAccepted {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub search_term: String,
    pub movie: Movie,
}

#[derive(Debug, Serialize)]
pub struct TrendingDto {
    pub records: Vec<TrendingRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
