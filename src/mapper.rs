//! Conversions from store rows into the response entities.

use crate::error::{Error, Result};
use crate::models::{
    GlobalStatistics, Listing, ListingId, ListingPage, Location, PriceStatistics,
};
use crate::stores::types::{as_f64, as_i64, as_str, fields, lookup, Row};
use serde_json::Value;

fn required<'a>(row: &'a Row, path: &str) -> Result<&'a Value> {
    lookup(row, path)
        .filter(|value| !value.is_null())
        .ok_or_else(|| Error::MalformedRow(format!("missing field {:?}", path)))
}

fn malformed(path: &str, expected: &str) -> Error {
    Error::MalformedRow(format!("field {:?} is not {}", path, expected))
}

/// Maps a projected listing document.
pub fn listing(row: &Row) -> Result<Listing> {
    let raw_id = as_str(required(row, fields::ID)?).ok_or_else(|| malformed(fields::ID, "an id"))?;
    let id = ListingId::parse(raw_id).map_err(|_| malformed(fields::ID, "a hexadecimal id"))?;

    let price = as_i64(required(row, fields::PRICE)?)
        .ok_or_else(|| malformed(fields::PRICE, "an integer"))?;

    let coordinates = required(row, fields::COORDINATES)?
        .as_array()
        .ok_or_else(|| malformed(fields::COORDINATES, "an array"))?;
    let (longitude, latitude) = match coordinates.as_slice() {
        [lon, lat] => (
            as_f64(lon).ok_or_else(|| malformed(fields::COORDINATES, "numeric"))?,
            as_f64(lat).ok_or_else(|| malformed(fields::COORDINATES, "numeric"))?,
        ),
        _ => return Err(malformed(fields::COORDINATES, "a [lon, lat] pair")),
    };

    let geohash = as_str(required(row, fields::GEOHASH)?)
        .ok_or_else(|| malformed(fields::GEOHASH, "a string"))?
        .to_string();

    Ok(Listing {
        id,
        price,
        location: Location {
            latitude,
            longitude,
            geohash,
        },
    })
}

pub fn listing_page(rows: &[Row]) -> Result<ListingPage> {
    let listings = rows.iter().map(listing).collect::<Result<Vec<_>>>()?;
    Ok(ListingPage::new(listings))
}

/// Reads the reducer outputs of an aggregate row; absent values stay `None`.
pub fn price_statistics(row: &Row) -> PriceStatistics {
    PriceStatistics {
        min: row.get(fields::PRICE_MIN).and_then(as_i64),
        max: row.get(fields::PRICE_MAX).and_then(as_i64),
        avg: row.get(fields::PRICE_AVG).and_then(as_f64),
    }
}

/// The group key of an aggregate row, `None` when null or absent.
pub fn group_key(row: &Row) -> Option<String> {
    row.get(fields::GROUP_ID).and_then(as_str).map(str::to_string)
}

/// Global statistics from the single-group aggregation, all-null when it produced no group.
pub fn global_statistics(rows: &[Row]) -> GlobalStatistics {
    GlobalStatistics {
        price: rows.first().map(price_statistics).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn document() -> Value {
        json!({
            "cursor": {"$oid": "5F7B1C2D3E4F5A6B7C8D9E0F"},
            "price": 185000,
            "location": {
                "point": {"type": "Point", "coordinates": [-3.7038, 40.4168]},
                "geohash": "ezjmgtwuzj"
            }
        })
    }

    #[test]
    fn maps_listing_document() {
        let listing = listing(&row(document())).unwrap();
        assert_eq!(listing.id.as_str(), "5f7b1c2d3e4f5a6b7c8d9e0f");
        assert_eq!(listing.price, 185_000);
        assert_eq!(listing.location.latitude, 40.4168);
        assert_eq!(listing.location.longitude, -3.7038);
        assert_eq!(listing.location.geohash, "ezjmgtwuzj");
    }

    #[test]
    fn accepts_plain_string_ids() {
        let mut doc = document();
        doc["cursor"] = json!("000000000000000000000007");
        assert_eq!(listing(&row(doc)).unwrap().id.as_str(), "000000000000000000000007");
    }

    #[test]
    fn reports_missing_fields() {
        let mut doc = document();
        doc["location"].as_object_mut().unwrap().remove("geohash");
        let err = listing(&row(doc)).unwrap_err();
        assert!(err.to_string().contains("location.geohash"));

        let mut doc = document();
        doc["location"]["point"]["coordinates"] = json!([1.0]);
        assert!(matches!(listing(&row(doc)), Err(Error::MalformedRow(_))));
    }

    #[test]
    fn empty_rows_make_an_empty_page() {
        let page = listing_page(&[]).unwrap();
        assert!(page.listings.is_empty());
        assert_eq!(page.next_cursor, "");
    }

    #[test]
    fn statistics_null_coalesce() {
        let stats = price_statistics(&row(json!({"_id": "ezjmgtw", "price_min": 10, "price_avg": null})));
        assert_eq!(
            stats,
            PriceStatistics {
                min: Some(10),
                max: None,
                avg: None
            }
        );
        assert_eq!(global_statistics(&[]).price, PriceStatistics::empty());
    }

    #[test]
    fn group_key_reads_bucket_prefix() {
        assert_eq!(group_key(&row(json!({"_id": "ezjmgtw"}))), Some("ezjmgtw".to_string()));
        assert_eq!(group_key(&row(json!({"_id": null}))), None);
    }
}
