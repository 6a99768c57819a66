use anyhow::Context;
use housing_insights::handler::{self, Request};
use housing_insights::{Config, DataApiStore, ListingStore, MemoryStore, QueryResolver, ResolverSettings};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ListingStore>> {
    if let Some(url) = &config.store.data_api_url {
        info!(
            "Using data API store at {} ({}/{})",
            url, config.store.database, config.store.collection
        );
        return Ok(Arc::new(DataApiStore::new(url.clone(), config.store.clone())?));
    }

    match &config.store.seed_file {
        Some(path) => Ok(Arc::new(MemoryStore::from_json_file(path).await?)),
        None => {
            warn!("No STORE_DATA_API_URL or LISTINGS_SEED_FILE set, using an empty store");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr, stdout carries the response
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let settings = ResolverSettings::from_config(&config)?;
    info!(
        "Max page size {}, statistics ceiling {}",
        settings.max_page_size, settings.statistics_ceiling
    );

    let store = build_store(&config).await?;
    let resolver = QueryResolver::new(store, settings);

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;
    let request: Request = serde_json::from_str(&input).context("Malformed request")?;

    let response = handler::handle(&resolver, &request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
