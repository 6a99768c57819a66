pub mod query;
pub mod statistics;

pub use query::{BoundingBox, IntRange, Point, PropertyFilter};
pub use statistics::{GlobalStatistics, LocalStatistics, PriceStatistics, Statistics};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sortable listing identifier (12-byte object id in hex).
///
/// Ordering is lexicographic on the normalized lowercase form, which for
/// fixed-width hex equals byte order. Doubles as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub const HEX_LEN: usize = 24;

    /// The smallest possible id; pagination starts after it.
    pub fn min() -> Self {
        Self("0".repeat(Self::HEX_LEN))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::HEX_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(format!(
                "cursor {:?} is not a {}-digit hexadecimal id",
                raw,
                Self::HEX_LEN
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Resolves a pagination cursor; absent or blank means "from the start".
    pub fn from_cursor(cursor: Option<&str>) -> Result<Self> {
        match cursor {
            Some(raw) if !raw.trim().is_empty() => Self::parse(raw),
            _ => Ok(Self::min()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location information for a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub geohash: String,
}

/// Core listing data model, as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub price: i64,
    pub location: Location,
}

/// One page of search results plus the cursor for the next call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(rename = "properties")]
    pub listings: Vec<Listing>,
    /// Id of the last listing, or empty when the page is empty.
    #[serde(rename = "page")]
    pub next_cursor: String,
}

impl ListingPage {
    pub fn new(listings: Vec<Listing>) -> Self {
        let next_cursor = listings
            .last()
            .map(|listing| listing.id.to_string())
            .unwrap_or_default();
        Self {
            listings,
            next_cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
