use crate::config::{Config, DEFAULT_STATISTICS_CEILING};
use crate::error::{Error, Result};
use crate::geohash;
use crate::mapper;
use crate::models::{
    BoundingBox, ListingId, ListingPage, LocalStatistics, PropertyFilter, Statistics,
};
use crate::scoring;
use crate::stores::types::{
    fields, Accumulator, FindQuery, GroupKey, GroupQuery, Predicate, Reducer, SortKey,
};
use crate::stores::ListingStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Length of the geohash prefix that defines a statistics bucket.
pub const BUCKET_PRECISION: usize = 7;

/// Limits applied by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub max_page_size: usize,
    /// Most recently published rows considered by statistics.
    pub statistics_ceiling: usize,
    pub bucket_precision: usize,
}

impl ResolverSettings {
    pub fn new(max_page_size: usize) -> Result<Self> {
        let settings = Self {
            max_page_size,
            statistics_ceiling: DEFAULT_STATISTICS_CEILING,
            bucket_precision: BUCKET_PRECISION,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = Self {
            max_page_size: config.max_page_size,
            statistics_ceiling: config.statistics_ceiling,
            bucket_precision: BUCKET_PRECISION,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(Error::Config("maximum page size must be positive".to_string()));
        }
        if self.statistics_ceiling == 0 {
            return Err(Error::Config("statistics ceiling must be positive".to_string()));
        }
        if self.bucket_precision == 0 {
            return Err(Error::Config("bucket precision must be positive".to_string()));
        }
        Ok(())
    }
}

/// Answers listing searches and price statistics against a [`ListingStore`].
#[derive(Clone)]
pub struct QueryResolver {
    store: Arc<dyn ListingStore>,
    settings: ResolverSettings,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn ListingStore>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    fn attribute_predicates(filter: &PropertyFilter) -> Vec<Predicate> {
        vec![
            Predicate::Between {
                field: fields::ROOMS,
                range: filter.n_rooms,
            },
            Predicate::Between {
                field: fields::SURFACE,
                range: filter.surface,
            },
            Predicate::Equals {
                field: fields::CONDITION,
                value: filter.condition.clone(),
            },
        ]
    }

    /// Describes the page query: box, attributes and cursor, newest first.
    pub fn listing_query(
        &self,
        bounding_box: &BoundingBox,
        filter: &PropertyFilter,
        after: ListingId,
    ) -> FindQuery {
        let mut predicates = vec![Predicate::WithinBox {
            field: fields::POINT,
            bbox: *bounding_box,
        }];
        predicates.extend(Self::attribute_predicates(filter));
        predicates.push(Predicate::After {
            field: fields::ID,
            id: after,
        });

        FindQuery {
            filter: predicates,
            sort: SortKey::descending(fields::PUBLISHED_ON),
            projection: vec![fields::ID, fields::PRICE, fields::LOCATION],
            limit: self.settings.max_page_size,
        }
    }

    /// Describes a min/max/avg price aggregation over the capped universe.
    pub fn statistics_query(&self, filter: &PropertyFilter, key: GroupKey) -> GroupQuery {
        let accumulator = |output, reducer| Accumulator {
            output,
            reducer,
            field: fields::PRICE,
        };
        GroupQuery {
            filter: Self::attribute_predicates(filter),
            sort: SortKey::descending(fields::PUBLISHED_ON),
            limit: self.settings.statistics_ceiling,
            key,
            accumulators: vec![
                accumulator(fields::PRICE_MIN, Reducer::Min),
                accumulator(fields::PRICE_MAX, Reducer::Max),
                accumulator(fields::PRICE_AVG, Reducer::Avg),
            ],
        }
    }

    /// Fetch one page of listings inside `bounding_box` matching `filter`.
    ///
    /// A blank or absent `cursor` starts from the beginning.
    pub async fn find_listings(
        &self,
        bounding_box: &BoundingBox,
        filter: &PropertyFilter,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        bounding_box.validate()?;
        filter.validate()?;
        let after = ListingId::from_cursor(cursor)?;

        debug!(
            "Finding listings after {} via {} (limit {})",
            after,
            self.store.backend_name(),
            self.settings.max_page_size
        );
        let query = self.listing_query(bounding_box, filter, after);

        let mut rows = self.store.find(&query).await.map_err(|e| {
            warn!("Listing query failed: {:#}", e);
            Error::Store(e)
        })?;
        rows.truncate(self.settings.max_page_size);

        let page = mapper::listing_page(&rows)?;
        debug!("Found {} listings, next page {:?}", page.listings.len(), page.next_cursor);
        Ok(page)
    }

    /// Price statistics per geohash bucket plus the global statistic.
    ///
    /// Both aggregations run concurrently; a failure of either fails the call.
    pub async fn compute_statistics(&self, filter: &PropertyFilter) -> Result<Statistics> {
        filter.validate()?;

        let local_query = self.statistics_query(
            filter,
            GroupKey::Prefix {
                field: fields::GEOHASH,
                length: self.settings.bucket_precision,
            },
        );
        let global_query = self.statistics_query(filter, GroupKey::All);

        let (local_rows, global_rows) = tokio::try_join!(
            self.store.aggregate(&local_query),
            self.store.aggregate(&global_query)
        )
        .map_err(|e| {
            warn!("Statistics query failed: {:#}", e);
            Error::Store(e)
        })?;

        let global = mapper::global_statistics(&global_rows);
        if global_rows.is_empty() {
            debug!("Statistics universe is empty for condition {:?}", filter.condition);
        }

        let local = local_rows
            .iter()
            .map(|row| -> Result<LocalStatistics> {
                let price = mapper::price_statistics(row);
                let prefix = mapper::group_key(row);
                Ok(LocalStatistics {
                    bounding_box: geohash::bounding_box_of(prefix.as_deref())?,
                    geohash_prefix: prefix.unwrap_or_default(),
                    score: scoring::score(price.avg, global.price.avg),
                    price,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Computed statistics over {} buckets (global avg {:?})",
            local.len(),
            global.price.avg
        );
        Ok(Statistics { local, global })
    }
}
