mod search;
mod trending;

pub use search::cmd_search_movies;
pub use trending::cmd_trending;

use std::sync::Arc;

use crate::clients::appwrite::AppwriteClient;
use crate::config::Config;
use crate::db::AppwriteTrendingRepository;
use crate::models::PosterUri;
use crate::services::TrendingService;

fn trending_service(config: &Config) -> anyhow::Result<TrendingService> {
    let client = AppwriteClient::new(&config.appwrite)?;
    Ok(TrendingService::new(
        Arc::new(AppwriteTrendingRepository::new(client)),
        PosterUri::from_config(&config.tmdb),
    ))
}
