use serde::{Deserialize, Serialize};

use crate::config::TmdbConfig;

/// A persisted search-term counter, as stored in the trending collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingRecord {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: i64,
    pub movie_id: i64,
    #[serde(default)]
    pub poster_uri: Option<String>,
}

/// Fields written when a term is seen for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrendingRecord {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: i64,
    pub movie_id: i64,
    pub poster_uri: Option<String>,
}

impl NewTrendingRecord {
    #[must_use]
    pub fn into_record(self, id: String) -> TrendingRecord {
        TrendingRecord {
            id,
            search_term: self.search_term,
            count: self.count,
            movie_id: self.movie_id,
            poster_uri: self.poster_uri,
        }
    }
}

/// Builds absolute poster URIs from the relative paths the metadata API
/// returns: `<base>/<size>/<path>`.
#[derive(Debug, Clone)]
pub struct PosterUri {
    base_url: String,
    size: String,
}

impl PosterUri {
    #[must_use]
    pub fn new(base_url: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            size: size.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TmdbConfig) -> Self {
        Self::new(&config.image_base_url, &config.poster_size)
    }

    #[must_use]
    pub fn resolve(&self, poster_path: Option<&str>) -> Option<String> {
        let path = poster_path?.trim_start_matches('/');
        if path.is_empty() {
            return None;
        }

        Some(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.size.trim_matches('/'),
            path
        ))
    }
}

impl Default for PosterUri {
    fn default() -> Self {
        Self::from_config(&TmdbConfig::default())
    }
}
