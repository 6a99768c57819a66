use crate::error::Result;
use crate::models::{BoundingBox, ListingPage, PropertyFilter, Statistics};
use crate::resolver::QueryResolver;
use serde::{Deserialize, Serialize};
use tracing::info;

/// An already-parsed query, as handed over by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    FindListings {
        bounding_box: BoundingBox,
        filter: PropertyFilter,
        #[serde(default)]
        page: String,
    },
    ComputeStatistics { filter: PropertyFilter },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Listings(ListingPage),
    Statistics(Statistics),
}

pub async fn handle(resolver: &QueryResolver, request: &Request) -> Result<Response> {
    match request {
        Request::FindListings {
            bounding_box,
            filter,
            page,
        } => {
            info!("Handling findListings (page {:?})", page);
            let result = resolver
                .find_listings(bounding_box, filter, Some(page.as_str()))
                .await?;
            Ok(Response::Listings(result))
        }
        Request::ComputeStatistics { filter } => {
            info!("Handling computeStatistics");
            let result = resolver.compute_statistics(filter).await?;
            Ok(Response::Statistics(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverSettings;
    use crate::stores::memory::fixtures::{listing, object_id};
    use crate::stores::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn resolver() -> QueryResolver {
        let documents = vec![
            listing(1, 100_000, 2, 50, "good", (40.4168, -3.7038), "2021-06-01T00:00:00Z"),
            listing(2, 200_000, 3, 80, "good", (40.4168, -3.7038), "2021-06-01T00:00:00Z"),
        ];
        QueryResolver::new(
            Arc::new(MemoryStore::new(documents)),
            ResolverSettings::new(100).unwrap(),
        )
    }

    fn filter() -> serde_json::Value {
        json!({"nRooms": {"min": 1, "max": 3}, "surface": {"min": 20, "max": 120}, "condition": "good"})
    }

    #[tokio::test]
    async fn find_listings_request_round_trip() {
        let request: Request = serde_json::from_value(json!({
            "findListings": {
                "boundingBox": {
                    "bottomLeft": {"latitude": 40.0, "longitude": -4.0},
                    "topRight": {"latitude": 41.0, "longitude": -3.0}
                },
                "filter": filter()
            }
        }))
        .unwrap();

        let response = handle(&resolver(), &request).await.unwrap();
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["page"], json!(object_id(2)));
        assert_eq!(body["properties"].as_array().unwrap().len(), 2);
        assert_eq!(body["properties"][0]["location"]["geohash"].as_str().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn statistics_request_matches_response_shape() {
        let request: Request =
            serde_json::from_value(json!({"computeStatistics": {"filter": filter()}})).unwrap();

        let response = handle(&resolver(), &request).await.unwrap();
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(
            body["globalStatistics"],
            json!({"price": {"min": 100000, "max": 200000, "avg": 150000.0}})
        );
        let local = &body["localStatistics"][0];
        assert_eq!(local["geohash"], json!("ezjmgtw"));
        assert_eq!(local["score"], json!(50));
        assert!(local["boundingBox"]["bottomLeft"]["latitude"].is_f64());
    }
}
