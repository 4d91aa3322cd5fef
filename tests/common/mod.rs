//! In-process stand-ins for the movie metadata API and the Appwrite
//! documents API, served over real sockets so the HTTP clients are exercised.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use cinetrend::config::Config;
use cinetrend::models::TrendingRecord;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TMDB_TOKEN: &str = "test-token";
pub const PROJECT_ID: &str = "cinetrend-test";

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn movie(id: i64, title: &str, poster: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "poster_path": poster,
        "overview": "",
        "release_date": "2022-03-01",
        "vote_average": 7.7,
        "original_language": "en"
    })
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TMDB_TOKEN}"))
}

async fn discover(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "page": 1,
        "results": [movie(693134, "Dune: Part Two", "/dune.jpg")],
        "total_pages": 1,
        "total_results": 1
    }))
    .into_response()
}

async fn search(headers: HeaderMap, Query(params): Query<SearchQuery>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let results = match params.query.as_str() {
        "broken" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
        }
        "batman" => vec![
            movie(414906, "The Batman", "/batman.jpg"),
            movie(268, "Batman", "/batman89.jpg"),
        ],
        _ => Vec::new(),
    };

    Json(json!({
        "page": 1,
        "total_results": results.len(),
        "total_pages": 1,
        "results": results,
    }))
    .into_response()
}

/// Starts the fake metadata API and returns its base URL.
pub async fn spawn_tmdb() -> String {
    let app = Router::new()
        .route("/3/discover/movie", get(discover))
        .route("/3/search/movie", get(search));
    format!("{}/3", serve(app).await)
}

/// Documents held by the fake Appwrite collection.
#[derive(Clone, Default)]
pub struct FakeStore {
    documents: Arc<Mutex<Vec<TrendingRecord>>>,
}

impl FakeStore {
    pub fn documents(&self) -> Vec<TrendingRecord> {
        self.documents.lock().unwrap().clone()
    }

    pub fn seed(&self, records: Vec<TrendingRecord>) {
        *self.documents.lock().unwrap() = records;
    }
}

fn appwrite_error(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "message": message, "type": kind, "code": status.as_u16() })),
    )
        .into_response()
}

fn has_project(headers: &HeaderMap) -> bool {
    headers
        .get("x-appwrite-project")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == PROJECT_ID)
}

async fn list_documents(
    State(store): State<FakeStore>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Response {
    if !has_project(&headers) {
        return appwrite_error(StatusCode::UNAUTHORIZED, "general_unauthorized_scope", "No project");
    }

    let mut documents = store.documents();
    let raw = raw.unwrap_or_default();

    let mut descending = false;
    let mut limit = 25;

    // Appwrite filters, then orders, then limits, whatever the query order.
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if key != "queries[]" {
            continue;
        }
        let query: Value = serde_json::from_str(&value).unwrap();
        match query["method"].as_str() {
            Some("equal") => {
                let wanted = query["values"][0].as_str().unwrap_or_default().to_string();
                documents.retain(|d| d.search_term == wanted);
            }
            Some("orderDesc") => descending = true,
            Some("limit") => {
                limit = usize::try_from(query["values"][0].as_u64().unwrap_or(25)).unwrap();
            }
            _ => {
                return appwrite_error(StatusCode::BAD_REQUEST, "general_query_invalid", "Bad query");
            }
        }
    }

    if descending {
        documents.sort_by(|a, b| b.count.cmp(&a.count));
    }
    let total = documents.len();
    documents.truncate(limit);

    Json(json!({ "total": total, "documents": documents })).into_response()
}

#[derive(Deserialize)]
struct CreateBody {
    #[serde(rename = "documentId")]
    document_id: String,
    data: Value,
}

async fn create_document(
    State(store): State<FakeStore>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Response {
    if !has_project(&headers) {
        return appwrite_error(StatusCode::UNAUTHORIZED, "general_unauthorized_scope", "No project");
    }

    let record = TrendingRecord {
        id: body.document_id,
        search_term: body.data["searchTerm"].as_str().unwrap_or_default().to_string(),
        count: body.data["count"].as_i64().unwrap_or_default(),
        movie_id: body.data["movie_id"].as_i64().unwrap_or_default(),
        poster_uri: body.data["poster_uri"].as_str().map(str::to_string),
    };
    store.documents.lock().unwrap().push(record.clone());

    (StatusCode::CREATED, Json(record)).into_response()
}

#[derive(Deserialize)]
struct UpdateBody {
    data: HashMap<String, Value>,
}

async fn update_document(
    State(store): State<FakeStore>,
    Path((_, _, id)): Path<(String, String, String)>,
    Json(body): Json<UpdateBody>,
) -> Response {
    let mut documents = store.documents.lock().unwrap();
    let Some(record) = documents.iter_mut().find(|d| d.id == id) else {
        return appwrite_error(
            StatusCode::NOT_FOUND,
            "document_not_found",
            "Document with the requested ID could not be found.",
        );
    };

    if let Some(count) = body.data.get("count").and_then(Value::as_i64) {
        record.count = count;
    }
    Json(record.clone()).into_response()
}

/// Starts the fake Appwrite endpoint and returns its base URL with the
/// backing store.
pub async fn spawn_appwrite() -> (String, FakeStore) {
    let store = FakeStore::default();
    let app = Router::new()
        .route(
            "/v1/databases/{database}/collections/{collection}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/v1/databases/{database}/collections/{collection}/documents/{id}",
            patch(update_document),
        )
        .with_state(store.clone());
    (format!("{}/v1", serve(app).await), store)
}

/// A configuration pointing both upstreams at the given fakes.
pub fn config(tmdb_url: &str, appwrite_url: &str) -> Config {
    let mut config = Config::default();
    config.tmdb.base_url = tmdb_url.to_string();
    config.tmdb.api_key = TMDB_TOKEN.to_string();
    config.tmdb.request_timeout_seconds = 5;
    config.appwrite.endpoint = appwrite_url.to_string();
    config.appwrite.project_id = PROJECT_ID.to_string();
    config.appwrite.database_id = "movies".to_string();
    config.appwrite.collection_id = "metrics".to_string();
    config.appwrite.request_timeout_seconds = 5;
    config
}

/// Polls `check` until it holds or a few seconds pass.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}
