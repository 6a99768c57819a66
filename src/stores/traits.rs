use crate::stores::types::{FindQuery, GroupQuery, Row};
use anyhow::Result;
use async_trait::async_trait;

/// Read capability over the listing document store.
///
/// Backends execute query descriptions and return rows in store order;
/// the resolver never depends on which backend it talks to.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Filter, sort, project and cap documents.
    async fn find(&self, query: &FindQuery) -> Result<Vec<Row>>;

    /// Filter, sort, cap, then group and reduce documents.
    async fn aggregate(&self, query: &GroupQuery) -> Result<Vec<Row>>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
