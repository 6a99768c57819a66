use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// Min/max/average price over a set of listings; all `None` for an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStatistics {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub avg: Option<f64>,
}

impl PriceStatistics {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Statistics for a single geohash bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStatistics {
    #[serde(rename = "geohash")]
    pub geohash_prefix: String,
    pub price: PriceStatistics,
    pub bounding_box: BoundingBox,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub price: PriceStatistics,
}

/// Per-bucket statistics plus the global statistic they are scored against.
///
/// Bucket order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "localStatistics")]
    pub local: Vec<LocalStatistics>,
    #[serde(rename = "globalStatistics")]
    pub global: GlobalStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use serde_json::json;

    #[test]
    fn empty_statistics_serialize_with_nulls() {
        let stats = Statistics::default();
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({
                "localStatistics": [],
                "globalStatistics": {"price": {"min": null, "max": null, "avg": null}}
            })
        );
    }

    #[test]
    fn local_statistics_serialize_to_response_shape() {
        let local = LocalStatistics {
            geohash_prefix: "u4pruyd".to_string(),
            price: PriceStatistics {
                min: Some(1),
                max: Some(3),
                avg: Some(2.0),
            },
            bounding_box: BoundingBox::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0)),
            score: 50,
        };
        assert_eq!(
            serde_json::to_value(&local).unwrap(),
            json!({
                "geohash": "u4pruyd",
                "price": {"min": 1, "max": 3, "avg": 2.0},
                "boundingBox": {
                    "bottomLeft": {"latitude": 1.0, "longitude": 2.0},
                    "topRight": {"latitude": 3.0, "longitude": 4.0}
                },
                "score": 50
            })
        );
    }
}
