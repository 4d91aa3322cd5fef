use crate::config::Config;

pub async fn cmd_trending(config: &Config) -> anyhow::Result<()> {
    config.validate_store()?;

    let records = super::trending_service(config)?.fetch_top_trending().await?;

    if records.is_empty() {
        println!("No trending movies found");
        return Ok(());
    }

    println!("Trending Movies");
    println!("{:-<60}", "");

    for (rank, record) in records.iter().enumerate() {
        println!(
            "{:>2}. {} ({} searches, movie {})",
            rank + 1,
            record.search_term,
            record.count,
            record.movie_id
        );
        if let Some(poster) = &record.poster_uri {
            println!("    {poster}");
        }
    }

    Ok(())
}
