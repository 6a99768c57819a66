use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_STATISTICS_CEILING: usize = 20_000;
pub const DEFAULT_DATABASE: &str = "timeSeriesDB";
pub const DEFAULT_COLLECTION: &str = "properties";
pub const DEFAULT_DATA_SOURCE: &str = "Cluster0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the document store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the Data API; when absent the in-memory backend is used.
    pub data_api_url: Option<String>,
    pub api_key: Option<String>,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    pub timeout_secs: u64,
    /// JSON array of documents for the in-memory backend.
    pub seed_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_api_url: None,
            api_key: None,
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            seed_file: None,
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub max_page_size: usize,
    pub statistics_ceiling: usize,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_page_size = match value("LISTINGS_MAX_PAGE_SIZE") {
            Some(raw) => parse_positive("LISTINGS_MAX_PAGE_SIZE", &raw)?,
            None => {
                return Err(Error::Config(
                    "LISTINGS_MAX_PAGE_SIZE must be set to a positive integer".to_string(),
                ))
            }
        };
        let statistics_ceiling = match value("LISTINGS_STATISTICS_CEILING") {
            Some(raw) => parse_positive("LISTINGS_STATISTICS_CEILING", &raw)?,
            None => DEFAULT_STATISTICS_CEILING,
        };
        let timeout_secs = match value("STORE_TIMEOUT_SECS") {
            Some(raw) => parse_positive("STORE_TIMEOUT_SECS", &raw)? as u64,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let defaults = StoreConfig::default();
        Ok(Self {
            max_page_size,
            statistics_ceiling,
            store: StoreConfig {
                data_api_url: value("STORE_DATA_API_URL"),
                api_key: value("STORE_API_KEY"),
                data_source: value("STORE_DATA_SOURCE").unwrap_or(defaults.data_source),
                database: value("STORE_DATABASE").unwrap_or(defaults.database),
                collection: value("STORE_COLLECTION").unwrap_or(defaults.collection),
                timeout_secs,
                seed_file: value("LISTINGS_SEED_FILE").map(PathBuf::from),
            },
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n as usize),
        Ok(n) => Err(Error::Config(format!("{} must be positive, got {}", key, n))),
        Err(e) => Err(Error::Config(format!(
            "{} must be an integer, got {:?}: {}",
            key, raw, e
        ))),
    }
}
