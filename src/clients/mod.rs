pub mod appwrite;
pub mod tmdb;

use std::time::Duration;

/// Build an HTTP client with the defaults every upstream call uses.
pub(crate) fn build_http_client(timeout_seconds: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Cinetrend/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
}
