use crate::config::StoreConfig;
use crate::stores::traits::ListingStore;
use crate::stores::types::{
    fields, FindQuery, GroupKey, GroupQuery, Predicate, Row, SortKey,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Document store reached through an HTTP Data API.
///
/// Queries are shipped as MongoDB-style filter documents and aggregation
/// pipelines to the `find` and `aggregate` actions.
pub struct DataApiStore {
    client: Client,
    config: StoreConfig,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    documents: Vec<Row>,
}

impl DataApiStore {
    pub fn new(base_url: impl Into<String>, config: StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Envelope naming the data source, database and collection.
    fn envelope(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("dataSource".into(), json!(self.config.data_source));
        body.insert("database".into(), json!(self.config.database));
        body.insert("collection".into(), json!(self.config.collection));
        body
    }

    async fn post(&self, action: &str, body: Map<String, Value>) -> Result<Vec<Row>> {
        let url = format!("{}/action/{}", self.base_url, action);
        debug!("Posting {} to {}", action, url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("api-key", api_key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach data API at {}", url))?;

        if !response.status().is_success() {
            warn!("Data API returned status: {}", response.status());
            anyhow::bail!("Data API {} failed: {}", action, response.status());
        }

        let payload: DocumentsResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode data API {} response", action))?;
        debug!("Data API {} returned {} documents", action, payload.documents.len());
        Ok(payload.documents)
    }
}

/// Renders predicates as a single filter document.
pub fn filter_document(filter: &[Predicate]) -> Value {
    let mut doc = Map::new();
    for predicate in filter {
        let (field, condition) = match predicate {
            Predicate::WithinBox { field, bbox } => (
                *field,
                json!({
                    "$geoWithin": {
                        "$box": [
                            [bbox.bottom_left.longitude, bbox.bottom_left.latitude],
                            [bbox.top_right.longitude, bbox.top_right.latitude]
                        ]
                    }
                }),
            ),
            Predicate::Between { field, range } => {
                (*field, json!({"$gte": range.min, "$lte": range.max}))
            }
            Predicate::Equals { field, value } => (*field, json!(value)),
            Predicate::After { field, id } => (*field, json!({"$gt": {"$oid": id.as_str()}})),
        };
        doc.insert(field.to_string(), condition);
    }
    Value::Object(doc)
}

fn sort_document(sort: &SortKey) -> Value {
    let mut doc = Map::new();
    doc.insert(sort.field.to_string(), json!(sort.direction.as_i32()));
    Value::Object(doc)
}

/// Renders a group query as `$match`, `$sort`, `$limit`, `$group` stages.
pub fn pipeline(query: &GroupQuery) -> Value {
    let group_id = match query.key {
        GroupKey::Prefix { field, length } => {
            json!({"$substr": [format!("${}", field), 0, length]})
        }
        GroupKey::All => Value::Null,
    };

    let mut group = Map::new();
    group.insert(fields::GROUP_ID.to_string(), group_id);
    for accumulator in &query.accumulators {
        let mut reducer = Map::new();
        reducer.insert(
            accumulator.reducer.operator().to_string(),
            json!(format!("${}", accumulator.field)),
        );
        group.insert(accumulator.output.to_string(), Value::Object(reducer));
    }

    json!([
        {"$match": filter_document(&query.filter)},
        {"$sort": sort_document(&query.sort)},
        {"$limit": query.limit},
        {"$group": Value::Object(group)}
    ])
}

#[async_trait]
impl ListingStore for DataApiStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Row>> {
        let projection: Map<String, Value> = query
            .projection
            .iter()
            .map(|field| (field.to_string(), json!(1)))
            .collect();

        let mut body = self.envelope();
        body.insert("filter".into(), filter_document(&query.filter));
        body.insert("sort".into(), sort_document(&query.sort));
        body.insert("projection".into(), Value::Object(projection));
        body.insert("limit".into(), json!(query.limit));

        self.post("find", body).await
    }

    async fn aggregate(&self, query: &GroupQuery) -> Result<Vec<Row>> {
        let mut body = self.envelope();
        body.insert("pipeline".into(), pipeline(query));

        self.post("aggregate", body).await
    }

    fn backend_name(&self) -> &'static str {
        "data-api"
    }
}
