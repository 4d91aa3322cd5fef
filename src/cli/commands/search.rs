use std::sync::Arc;

use tracing::warn;

use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::services::{SearchError, SearchService};

pub async fn cmd_search_movies(config: &Config, query: &str) -> anyhow::Result<()> {
    config.validate(true)?;

    if query.is_empty() {
        println!("Popular movies");
    } else {
        println!("Searching for: {query}");
    }

    let search = SearchService::new(Arc::new(TmdbClient::new(&config.tmdb)?));

    let movies = match search.search(query).await {
        Ok(movies) => movies,
        Err(e) => {
            if let SearchError::Fetch(source) = &e {
                warn!("Movie lookup failed: {}", source);
            }
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    println!();
    println!("{:-<60}", "");

    for movie in &movies {
        let year = movie
            .release_year()
            .map_or_else(|| "----".to_string(), |y| y.to_string());
        let rating = movie
            .vote_average
            .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
        let language = movie.original_language.as_deref().unwrap_or("?");

        println!("• {} ({year})", movie.title);
        println!("  Rating: {rating} | Language: {language} | ID: {}", movie.id);
    }

    if let Some(first) = movies.first()
        && !query.is_empty()
    {
        match super::trending_service(config)?
            .record_selection(query, first)
            .await
        {
            Ok(outcome) => println!("\n'{query}' searched {} time(s)", outcome.count()),
            Err(e) => warn!("Error updating trending: {}", e),
        }
    }

    Ok(())
}
