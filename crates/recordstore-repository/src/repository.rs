use std::marker::PhantomData;
use std::sync::Arc;

use recordstore_core::{
    DayEnd, PaginationConfig, Period, RecordStoreConfig, SharedClock, SystemClock, TimeWindow,
    parse_timestamp, to_utc,
};
use recordstore_storage::{
    Collection, Document, DynStore, Filter, FindOptions, SortParam, StorageError, UpdateOptions,
};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::error::{RangeBound, RepositoryError, RepositoryResult};
use crate::pagination::PageRequest;
use crate::record::{Record, Stored};

/// Generic accessor for one record type.
///
/// Every operation delegates to the injected [`DocumentStore`](recordstore_storage::DocumentStore).
/// "Today" and the other calendar windows are taken from the injected clock
/// in UTC. Listings are newest first.
pub struct Repository<T: Record> {
    store: DynStore,
    clock: SharedClock,
    collection: Arc<Collection>,
    pagination: PaginationConfig,
    day_end: DayEnd,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            collection: self.collection.clone(),
            pagination: self.pagination.clone(),
            day_end: self.day_end,
            _record: PhantomData,
        }
    }
}

impl<T: Record> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection.name)
            .field("backend", &self.store.backend_name())
            .field("pagination", &self.pagination)
            .field("day_end", &self.day_end)
            .finish()
    }
}

impl<T: Record> Repository<T> {
    /// Creates an accessor on the system clock with default settings.
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            clock: SystemClock::shared(),
            collection: Arc::new(T::collection()),
            pagination: PaginationConfig::default(),
            day_end: DayEnd::default(),
            _record: PhantomData,
        }
    }

    /// Uses `clock` to decide what "today" is.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Applies pagination limits and the day-end policy from `config`.
    pub fn with_config(mut self, config: &RecordStoreConfig) -> Self {
        self.pagination = config.pagination.clone();
        self.day_end = config.time_window.day_end;
        self
    }

    /// Overrides the collection descriptor derived from `T`.
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collection = Arc::new(collection);
        self
    }

    /// The collection every operation targets.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Validates and persists a new record.
    ///
    /// The store assigns the identifier (unless `fields` carries a string
    /// `id`) and both timestamps.
    #[instrument(skip(self, fields), fields(collection = %self.collection.name))]
    pub async fn create<S>(&self, fields: &S) -> RepositoryResult<Stored<T>>
    where
        S: Serialize + ?Sized,
    {
        let value = to_value(fields)?;
        let doc = self.store.insert(&self.collection, &value).await?;
        debug!(id = %doc.id, "Record created");
        decode(doc)
    }

    /// Lists records created during the current UTC day.
    pub async fn list_today(&self, page: PageRequest) -> RepositoryResult<Vec<Stored<T>>> {
        self.list_current(Period::Day, page).await
    }

    /// Lists records created during the current day, week or month.
    #[instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn list_current(
        &self,
        period: Period,
        page: PageRequest,
    ) -> RepositoryResult<Vec<Stored<T>>> {
        let now = self.clock.now();
        let window = period
            .window_at(now, self.day_end)
            .map_err(|source| RepositoryError::window(period, source))?;
        self.list(Filter::created_within(window), page).await
    }

    /// Lists records with `start <= createdAt < end`.
    ///
    /// Bounds accept RFC 3339, `YYYY-MM-DD`, an offset-less date-time (UTC)
    /// or integer epoch milliseconds. A window whose end is not after its
    /// start yields no records.
    #[instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn list_in_range(
        &self,
        start: &str,
        end: &str,
        page: PageRequest,
    ) -> RepositoryResult<Vec<Stored<T>>> {
        let start = parse_bound(RangeBound::Start, start)?;
        let end = parse_bound(RangeBound::End, end)?;
        self.list_in_window(TimeWindow { start, end }, page).await
    }

    /// Lists records whose `createdAt` falls in `window`.
    ///
    /// Bounds are normalized to UTC first; a bound with no representable UTC
    /// value is an [`RepositoryError::InvalidRange`].
    pub async fn list_in_window(
        &self,
        window: TimeWindow,
        page: PageRequest,
    ) -> RepositoryResult<Vec<Stored<T>>> {
        let window = TimeWindow {
            start: utc_bound(RangeBound::Start, window.start)?,
            end: utc_bound(RangeBound::End, window.end)?,
        };
        if window.is_empty() {
            debug!(%window, "Empty window, skipping store query");
            return Ok(Vec::new());
        }
        self.list(Filter::created_within(window), page).await
    }

    /// Lists every record of the collection.
    #[instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn list_all(&self, page: PageRequest) -> RepositoryResult<Vec<Stored<T>>> {
        self.list(Filter::all(), page).await
    }

    /// Fetches one record. A missing record is `Ok(None)`.
    #[instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Stored<T>>> {
        self.store
            .find_one(&self.collection, &Filter::by_id(id))
            .await?
            .map(decode)
            .transpose()
    }

    /// Merges `changes` into an existing record and returns the result.
    ///
    /// The merged record is validated against the schema before it is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no record has this ID.
    #[instrument(skip(self, changes), fields(collection = %self.collection.name))]
    pub async fn update<S>(&self, id: &str, changes: &S) -> RepositoryResult<Stored<T>>
    where
        S: Serialize + ?Sized,
    {
        let patch = to_value(changes)?;
        let updated = self
            .store
            .find_one_and_update(
                &self.collection,
                &Filter::by_id(id),
                &patch,
                &UpdateOptions::default(),
            )
            .await?;

        match updated {
            Some(doc) => {
                debug!(id, "Record updated");
                decode(doc)
            }
            None => Err(RepositoryError::not_found(self.collection.name.as_str(), id)),
        }
    }

    /// Removes a record and returns it as it was. Deleting a missing record
    /// is `Ok(None)`.
    #[instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn delete_record(&self, id: &str) -> RepositoryResult<Option<Stored<T>>> {
        let removed = self
            .store
            .find_one_and_remove(&self.collection, &Filter::by_id(id))
            .await?;

        if removed.is_some() {
            debug!(id, "Record deleted");
        }
        removed.map(decode).transpose()
    }

    async fn list(&self, filter: Filter, page: PageRequest) -> RepositoryResult<Vec<Stored<T>>> {
        let page = page.resolve(&self.pagination);
        let options = FindOptions::new()
            .with_sort(SortParam::newest_first())
            .with_skip(page.skip())
            .with_limit(page.limit);

        let docs = self
            .store
            .find_many(&self.collection, &filter, &options)
            .await?;
        debug!(count = docs.len(), page = page.page, limit = page.limit, "Listed records");

        docs.into_iter().map(decode).collect()
    }
}

fn to_value<S: Serialize + ?Sized>(fields: &S) -> Result<Value, StorageError> {
    serde_json::to_value(fields).map_err(|e| StorageError::validation(e.to_string()))
}

fn decode<T: Record>(doc: Document) -> RepositoryResult<Stored<T>> {
    Ok(Stored::from_document(doc)?)
}

fn parse_bound(bound: RangeBound, value: &str) -> RepositoryResult<OffsetDateTime> {
    parse_timestamp(value)
        .map_err(|e| RepositoryError::invalid_range(bound, value, e.to_string()))
}

fn utc_bound(bound: RangeBound, instant: OffsetDateTime) -> RepositoryResult<OffsetDateTime> {
    to_utc(instant)
        .map_err(|e| RepositoryError::invalid_range(bound, instant.to_string(), e.to_string()))
}
