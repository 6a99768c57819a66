use thiserror::Error;

/// Errors surfaced by the listing resolver.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid startup configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input that should have been rejected by the query front end.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Geohash containing a character outside the base-32 alphabet.
    #[error("Invalid geohash {geohash:?}: unexpected character {found:?}")]
    InvalidGeohash { geohash: String, found: char },

    /// Store row missing a field the mapping layer requires.
    #[error("Malformed store row: {0}")]
    MalformedRow(String),

    /// The store could not execute a query.
    #[error("Store query failed: {0:#}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
