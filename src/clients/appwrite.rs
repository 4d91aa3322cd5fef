//! Minimal Appwrite Databases REST client.
//!
//! Covers the document operations the trending collection needs: filtered and
//! ordered listing, creation and partial update. Queries use the JSON query
//! syntax accepted by Appwrite 1.5 and later.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::AppwriteConfig;

#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("Appwrite request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Appwrite API error: {status} {kind} - {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("invalid Appwrite URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Appwrite returned a malformed body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<Value> },
    OrderDesc { attribute: String },
    Limit(usize),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Self::OrderDesc {
            attribute: attribute.into(),
        }
    }

    #[must_use]
    pub const fn limit(limit: usize) -> Self {
        Self::Limit(limit)
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Self::OrderDesc { attribute } => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Self::Limit(limit) => json!({
                "method": "limit",
                "values": [limit],
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentList<T> {
    #[serde(default)]
    pub total: u64,
    pub documents: Vec<T>,
}

#[derive(Serialize)]
struct CreateBody<'a, T> {
    #[serde(rename = "documentId")]
    document_id: &'a str,
    data: &'a T,
}

#[derive(Serialize)]
struct UpdateBody<'a, T> {
    data: &'a T,
}

#[derive(Clone)]
pub struct AppwriteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    collection_id: String,
    api_key: Option<String>,
}

impl AppwriteClient {
    pub fn new(config: &AppwriteConfig) -> Result<Self, AppwriteError> {
        let client = super::build_http_client(config.request_timeout_seconds)?;
        Ok(Self::with_client(client, config))
    }

    #[must_use]
    pub fn with_client(client: Client, config: &AppwriteConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            collection_id: config.collection_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// A fresh document id, valid under Appwrite's id rules.
    #[must_use]
    pub fn unique_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, self.collection_id
        )
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header(reqwest::header::ACCEPT, "application/json");

        match &self.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn send<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R, AppwriteError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&body).unwrap_or(ErrorBody {
                message: body,
                kind: String::new(),
            });
            return Err(AppwriteError::Api {
                status: status.as_u16(),
                kind: error.kind,
                message: error.message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        queries: &[Query],
    ) -> Result<DocumentList<T>, AppwriteError> {
        let mut url = Url::parse(&self.documents_url())?;
        {
            let mut pairs = url.query_pairs_mut();
            for query in queries {
                pairs.append_pair("queries[]", &query.to_json().to_string());
            }
        }

        debug!(queries = queries.len(), "Listing Appwrite documents");
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn create_document<T, R>(&self, document_id: &str, data: &T) -> Result<R, AppwriteError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = Url::parse(&self.documents_url())?;
        debug!(document_id, "Creating Appwrite document");

        let builder = self
            .request(Method::POST, url)
            .json(&CreateBody { document_id, data });
        self.send(builder).await
    }

    pub async fn update_document<T, R>(&self, document_id: &str, data: &T) -> Result<R, AppwriteError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut url = Url::parse(&self.documents_url())?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(document_id);
        debug!(document_id, "Updating Appwrite document");

        let builder = self
            .request(Method::PATCH, url)
            .json(&UpdateBody { data });
        self.send(builder).await
    }
}
