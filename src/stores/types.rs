use crate::models::{BoundingBox, IntRange, ListingId};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A row returned by the store: a document or an aggregate result.
pub type Row = Map<String, Value>;

/// Document paths of the stored listing documents.
pub mod fields {
    pub const ID: &str = "cursor";
    pub const PRICE: &str = "price";
    pub const ROOMS: &str = "n_rooms";
    pub const SURFACE: &str = "surface";
    pub const CONDITION: &str = "condition";
    pub const PUBLISHED_ON: &str = "published_on";
    pub const LOCATION: &str = "location";
    pub const POINT: &str = "location.point";
    pub const COORDINATES: &str = "location.point.coordinates";
    pub const GEOHASH: &str = "location.geohash";
    /// Key of the group in aggregate rows.
    pub const GROUP_ID: &str = "_id";
    pub const PRICE_MIN: &str = "price_min";
    pub const PRICE_MAX: &str = "price_max";
    pub const PRICE_AVG: &str = "price_avg";
}

/// A single match predicate; a query matches the conjunction of its predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Point at `field` lies strictly inside `bbox`.
    WithinBox { field: &'static str, bbox: BoundingBox },
    /// Integer at `field` lies in the inclusive range.
    Between { field: &'static str, range: IntRange },
    Equals { field: &'static str, value: String },
    /// Identifier at `field` is strictly greater than `id`.
    After { field: &'static str, id: ListingId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: Direction,
}

impl SortKey {
    pub fn descending(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

/// Filter, sort, cap and project documents.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Vec<Predicate>,
    pub sort: SortKey,
    /// Top-level fields kept in each returned row.
    pub projection: Vec<&'static str>,
    pub limit: usize,
}

/// How rows are grouped in an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// First `length` characters of the string at `field`.
    Prefix { field: &'static str, length: usize },
    /// Every row in one group. No rows means no group.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Min,
    Max,
    Avg,
}

impl Reducer {
    pub fn operator(self) -> &'static str {
        match self {
            Reducer::Min => "$min",
            Reducer::Max => "$max",
            Reducer::Avg => "$avg",
        }
    }
}

/// Writes `reducer(field)` of each group under `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    pub output: &'static str,
    pub reducer: Reducer,
    pub field: &'static str,
}

/// Filter, sort and cap documents, then group and reduce them.
///
/// Result rows carry the group key under [`fields::GROUP_ID`] (null for
/// [`GroupKey::All`]) and one entry per accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupQuery {
    pub filter: Vec<Predicate>,
    pub sort: SortKey,
    pub limit: usize,
    pub key: GroupKey,
    pub accumulators: Vec<Accumulator>,
}

/// Resolves a dotted path such as `location.point.coordinates`.
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Strips a single-key extended JSON wrapper (`{"$oid": ..}`, `{"$numberLong": ..}`).
pub fn unwrap_extended(value: &Value) -> &Value {
    const WRAPPERS: [&str; 5] = ["$oid", "$numberInt", "$numberLong", "$numberDouble", "$date"];
    if let Some(obj) = value.as_object().filter(|obj| obj.len() == 1) {
        if let Some(inner) = WRAPPERS.iter().find_map(|key| obj.get(*key)) {
            return inner;
        }
    }
    value
}

pub fn as_i64(value: &Value) -> Option<i64> {
    let value = unwrap_extended(value);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    let value = unwrap_extended(value);
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

pub fn as_str(value: &Value) -> Option<&str> {
    unwrap_extended(value).as_str()
}

/// Sort order over stored values: missing < numbers < text < timestamps.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Missing,
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Number(_) => 1,
            SortValue::Text(_) => 2,
            SortValue::Time(_) => 3,
        }
    }

    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return SortValue::Missing;
        };
        if let Some(date) = value.as_object().and_then(|obj| obj.get("$date")) {
            return match parse_time(unwrap_extended(date)) {
                Some(time) => SortValue::Time(time),
                None => SortValue::Missing,
            };
        }
        match unwrap_extended(value) {
            Value::Number(n) => n.as_f64().map(SortValue::Number).unwrap_or(SortValue::Missing),
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(time) => SortValue::Time(time.with_timezone(&Utc)),
                Err(_) => SortValue::Text(s.clone()),
            },
            _ => SortValue::Missing,
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.partial_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.partial_cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.partial_cmp(b),
            _ => self.rank().partial_cmp(&other.rank()),
        }
    }
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<i64>().ok().and_then(|ms| Utc.timestamp_millis_opt(ms).single())),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Compares two stored values the way the store orders a sort key.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    SortValue::from_value(a)
        .partial_cmp(&SortValue::from_value(b))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn lookup_follows_dotted_paths() {
        let doc = row(json!({"location": {"point": {"coordinates": [1.0, 2.0]}}}));
        assert_eq!(lookup(&doc, fields::COORDINATES), Some(&json!([1.0, 2.0])));
        assert_eq!(lookup(&doc, "location.geohash"), None);
        assert_eq!(lookup(&doc, "price"), None);
    }

    #[test]
    fn extended_json_numbers_and_ids_unwrap() {
        assert_eq!(as_i64(&json!({"$numberLong": "250000"})), Some(250_000));
        assert_eq!(as_i64(&json!(250000)), Some(250_000));
        assert_eq!(as_f64(&json!({"$numberDouble": "1.5"})), Some(1.5));
        assert_eq!(as_str(&json!({"$oid": "abc"})), Some("abc"));
        assert_eq!(as_str(&json!({"other": "abc"})), None);
    }

    #[test]
    fn timestamps_compare_chronologically() {
        let earlier = json!("2021-03-01T10:00:00Z");
        let later = json!({"$date": "2021-03-02T09:00:00+00:00"});
        assert_eq!(compare_values(Some(&earlier), Some(&later)), Ordering::Less);
        let millis = json!({"$date": {"$numberLong": "1614769200000"}});
        assert_eq!(compare_values(Some(&millis), Some(&earlier)), Ordering::Greater);
    }

    #[test]
    fn missing_values_sort_first() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
    }
}
