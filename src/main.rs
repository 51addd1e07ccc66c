use autoria_scout::scrapers::{ChromeSessionFactory, HttpFetcher};
use autoria_scout::store::SqliteStore;
use autoria_scout::{run_scrape, ScrapeConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScrapeConfig::from_env()?;

    info!("🚗 AutoRia Scout");
    info!(
        "Scraping {} page(s) of {} with {} worker(s)",
        config.num_pages, config.base_url, config.num_workers
    );

    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let sessions = Arc::new(ChromeSessionFactory::new(&config));

    let summary = run_scrape(&config, fetcher, Arc::clone(&store), sessions).await?;

    info!(
        "✅ Scraping done: {} saved, {} already stored, {} failed, {} unprocessed",
        summary.saved, summary.already_stored, summary.failed, summary.unprocessed
    );
    info!("💾 {} listings in {}", store.count()?, config.database_path.display());
    info!("Summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
