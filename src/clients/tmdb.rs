use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::TmdbConfig;
use crate::models::MoviePage;

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TMDB API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("TMDB returned a malformed body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Which listing a search term maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieQuery<'a> {
    Popular,
    Search(&'a str),
}

impl<'a> MovieQuery<'a> {
    #[must_use]
    pub fn for_term(term: &'a str) -> Self {
        if term.is_empty() {
            Self::Popular
        } else {
            Self::Search(term)
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Popular => "/discover/movie?sort_by=popularity.desc".to_string(),
            Self::Search(term) => format!("/search/movie?query={}", urlencoding::encode(term)),
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, TmdbError> {
        let client = super::build_http_client(config.request_timeout_seconds)?;
        Ok(Self::with_client(client, &config.base_url, &config.api_key))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn url(&self, query: &MovieQuery<'_>) -> String {
        format!("{}{}", self.base_url, query.path())
    }

    pub async fn fetch(&self, query: &MovieQuery<'_>) -> Result<MoviePage, TmdbError> {
        let url = self.url(query);
        debug!(url = %url, "Fetching movies from TMDB");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TmdbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
