use crate::stores::traits::ListingStore;
use crate::models::Point;
use crate::stores::types::{
    as_f64, as_i64, as_str, compare_values, fields, lookup, unwrap_extended, Accumulator,
    Direction, FindQuery, GroupKey, GroupQuery, Predicate, Reducer, Row, SortKey,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Document store held in memory.
///
/// Evaluates the same query descriptions a remote store would receive, over
/// documents kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Row>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Row>) -> Self {
        Self { documents }
    }

    /// Builds a store from JSON values; every value must be an object.
    pub fn from_values(values: Vec<Value>) -> Result<Self> {
        let documents = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(doc) => Ok(doc),
                other => anyhow::bail!("Document {} is not an object: {}", i, other),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(documents))
    }

    /// Load documents from a JSON array file
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let values: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Seed file {} is not a JSON array", path.display()))?;
        let store = Self::from_values(values)?;
        info!("Loaded {} documents from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Matching documents, stably sorted and capped.
    fn select(&self, filter: &[Predicate], sort: &SortKey, limit: usize) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .documents
            .iter()
            .filter(|doc| filter.iter().all(|predicate| matches(doc, predicate)))
            .collect();
        rows.sort_by(|a, b| {
            let ordering = compare_values(lookup(a, sort.field), lookup(b, sort.field));
            match sort.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
        rows.truncate(limit);
        rows
    }
}

fn point_of(doc: &Row, field: &str) -> Option<Point> {
    let coordinates = lookup(doc, &format!("{}.coordinates", field))?.as_array()?;
    match coordinates.as_slice() {
        [lon, lat] => Some(Point::new(as_f64(lat)?, as_f64(lon)?)),
        _ => None,
    }
}

fn matches(doc: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::WithinBox { field, bbox } => point_of(doc, field)
            .map(|point| bbox.strictly_contains(&point))
            .unwrap_or(false),
        Predicate::Between { field, range } => lookup(doc, field)
            .and_then(as_i64)
            .map(|value| range.contains(value))
            .unwrap_or(false),
        Predicate::Equals { field, value } => {
            lookup(doc, field).and_then(as_str) == Some(value.as_str())
        }
        Predicate::After { field, id } => lookup(doc, field)
            .and_then(as_str)
            .map(|raw| raw.to_ascii_lowercase().as_str() > id.as_str())
            .unwrap_or(false),
    }
}

fn project(doc: &Row, projection: &[&'static str]) -> Row {
    if projection.is_empty() {
        return doc.clone();
    }
    projection
        .iter()
        .filter_map(|field| doc.get(*field).map(|value| (field.to_string(), value.clone())))
        .collect()
}

fn group_key(doc: &Row, key: &GroupKey) -> Value {
    match key {
        GroupKey::Prefix { field, length } => {
            let raw = lookup(doc, field).and_then(as_str).unwrap_or("");
            Value::String(raw.chars().take(*length).collect())
        }
        GroupKey::All => Value::Null,
    }
}

fn reduce(rows: &[&Row], accumulator: &Accumulator) -> Value {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|doc| lookup(doc, accumulator.field).map(unwrap_extended))
        .filter(|value| as_f64(value).is_some())
        .collect();
    if values.is_empty() {
        return Value::Null;
    }
    let numeric = |value: &&Value| as_f64(value).unwrap_or(f64::NAN);
    match accumulator.reducer {
        Reducer::Min => values
            .iter()
            .copied()
            .min_by(|a, b| numeric(a).total_cmp(&numeric(b)))
            .cloned()
            .unwrap_or(Value::Null),
        Reducer::Max => values
            .iter()
            .copied()
            .max_by(|a, b| numeric(a).total_cmp(&numeric(b)))
            .cloned()
            .unwrap_or(Value::Null),
        Reducer::Avg => {
            let sum: f64 = values.iter().map(numeric).sum();
            json!(sum / values.len() as f64)
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self
            .select(&query.filter, &query.sort, query.limit)
            .into_iter()
            .map(|doc| project(doc, &query.projection))
            .collect();
        debug!("Memory find returned {} rows", rows.len());
        Ok(rows)
    }

    async fn aggregate(&self, query: &GroupQuery) -> Result<Vec<Row>> {
        let selected = self.select(&query.filter, &query.sort, query.limit);

        let mut order: Vec<Value> = Vec::new();
        let mut groups: HashMap<String, Vec<&Row>> = HashMap::new();
        for doc in selected {
            let key = group_key(doc, &query.key);
            let slot = key.to_string();
            if !groups.contains_key(&slot) {
                order.push(key);
            }
            groups.entry(slot).or_default().push(doc);
        }

        let rows: Vec<Row> = order
            .into_iter()
            .map(|key| {
                let members = groups.get(&key.to_string()).map(Vec::as_slice).unwrap_or(&[]);
                let mut row = Row::new();
                for accumulator in &query.accumulators {
                    row.insert(accumulator.output.to_string(), reduce(members, accumulator));
                }
                row.insert(fields::GROUP_ID.to_string(), key);
                row
            })
            .collect();
        debug!("Memory aggregate produced {} groups", rows.len());
        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{listing, object_id};
    use super::*;
    use crate::models::{BoundingBox, IntRange, ListingId};

    const MADRID: (f64, f64) = (40.4168, -3.7038);

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            listing(1, 100_000, 2, 50, "good", MADRID, "2021-01-01T00:00:00Z"),
            listing(2, 200_000, 3, 80, "good", MADRID, "2021-01-03T00:00:00Z"),
            listing(3, 300_000, 5, 80, "good", MADRID, "2021-01-02T00:00:00Z"),
            listing(4, 400_000, 2, 60, "new", (41.3874, 2.1686), "2021-01-04T00:00:00Z"),
        ])
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| as_str(row.get(fields::ID).unwrap()).unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn find_filters_sorts_and_projects() {
        let query = FindQuery {
            filter: vec![
                Predicate::Between {
                    field: fields::ROOMS,
                    range: IntRange::new(1, 3),
                },
                Predicate::Equals {
                    field: fields::CONDITION,
                    value: "good".to_string(),
                },
            ],
            sort: SortKey::descending(fields::PUBLISHED_ON),
            projection: vec![fields::ID, fields::PRICE],
            limit: 10,
        };
        let rows = store().find(&query).await.unwrap();
        assert_eq!(ids(&rows), vec![object_id(2), object_id(1)]);
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0].get(fields::CONDITION).is_none());
    }

    #[tokio::test]
    async fn find_respects_box_cursor_and_limit() {
        let query = FindQuery {
            filter: vec![
                Predicate::WithinBox {
                    field: fields::POINT,
                    bbox: BoundingBox::new(
                        crate::models::Point::new(40.0, -4.0),
                        crate::models::Point::new(41.0, -3.0),
                    ),
                },
                Predicate::After {
                    field: fields::ID,
                    id: ListingId::parse(&object_id(1)).unwrap(),
                },
            ],
            sort: SortKey {
                field: fields::PUBLISHED_ON,
                direction: Direction::Ascending,
            },
            projection: Vec::new(),
            limit: 1,
        };
        let rows = store().find(&query).await.unwrap();
        assert_eq!(ids(&rows), vec![object_id(3)]);
    }

    #[tokio::test]
    async fn aggregate_groups_by_prefix() {
        let query = GroupQuery {
            filter: Vec::new(),
            sort: SortKey::descending(fields::PUBLISHED_ON),
            limit: 3,
            key: GroupKey::Prefix {
                field: fields::GEOHASH,
                length: 5,
            },
            accumulators: vec![
                Accumulator {
                    output: fields::PRICE_MIN,
                    reducer: Reducer::Min,
                    field: fields::PRICE,
                },
                Accumulator {
                    output: fields::PRICE_AVG,
                    reducer: Reducer::Avg,
                    field: fields::PRICE,
                },
            ],
        };
        let rows = store().aggregate(&query).await.unwrap();
        // The cap keeps the three most recent: 4 (Barcelona), 2 and 3 (Madrid).
        assert_eq!(rows.len(), 2);
        let madrid = rows
            .iter()
            .find(|row| row[fields::GROUP_ID] == json!(crate::geohash::encode(MADRID.0, MADRID.1, 5)))
            .unwrap();
        assert_eq!(madrid[fields::PRICE_MIN], json!(200_000));
        assert_eq!(madrid[fields::PRICE_AVG], json!(250_000.0));
    }

    #[tokio::test]
    async fn aggregate_all_over_nothing_yields_no_group() {
        let query = GroupQuery {
            filter: vec![Predicate::Equals {
                field: fields::CONDITION,
                value: "ruined".to_string(),
            }],
            sort: SortKey::descending(fields::PUBLISHED_ON),
            limit: 100,
            key: GroupKey::All,
            accumulators: vec![Accumulator {
                output: fields::PRICE_MAX,
                reducer: Reducer::Max,
                field: fields::PRICE,
            }],
        };
        assert!(store().aggregate(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_demo_seed_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/seed.json");
        let store = MemoryStore::from_json_file(path).await.unwrap();
        assert_eq!(store.len(), 6);
        assert!(MemoryStore::from_json_file("missing-seed.json").await.is_err());
    }

    #[test]
    fn from_values_rejects_non_objects() {
        assert!(MemoryStore::from_values(vec![json!([1, 2])]).is_err());
        let store = MemoryStore::from_values(vec![json!({"price": 1})]).unwrap();
        assert_eq!(store.len(), 1);
    }
}
