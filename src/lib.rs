pub mod config;
pub mod error;
pub mod geohash;
pub mod handler;
pub mod mapper;
pub mod models;
pub mod resolver;
pub mod scoring;
pub mod stores;

pub use config::Config;
pub use error::{Error, Result};
pub use resolver::{QueryResolver, ResolverSettings};
pub use stores::{DataApiStore, ListingStore, MemoryStore};
