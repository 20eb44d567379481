//! The generic in-memory record store.
//!
//! [`MemoryPersistence`] owns an unordered collection of records of one type, answers
//! filter/sort/paging queries over snapshots of it, and optionally synchronizes the collection
//! with an external medium through a [`Loader`] and a [`Saver`].
//!
//! # Locking
//!
//! A single async mutex guards the collection. Reads hold it only while copying the
//! collection; caller-supplied filters, comparators and projections run on the private copy
//! after the lock is released. Writes hold it only for the structural change; the filter of
//! [`MemoryPersistence::delete_by_filter`] is the one caller function that runs under the lock,
//! and it must not call back into the store. The save that follows a mutation runs after the
//! mutation's critical section and persists whatever the collection holds when the save
//! acquires the lock.

use async_trait::async_trait;
use mea::mutex::Mutex;
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    cmp::Ordering,
    fmt,
    sync::{
        Arc,
        atomic::{self, AtomicBool, AtomicUsize},
    },
};
use tracing::{debug, trace};

use recordlayer_core::{
    config::{ConfigParams, MAX_PAGE_SIZE_KEY},
    contract::{Cleanable, Configurable, Loader, Openable, QueryablePageReader, Saver},
    error::{PersistenceError, PersistenceResult},
    page::{DataPage, DEFAULT_MAX_PAGE_SIZE, PagingParams},
    query::Query,
    record::{FieldMap, RecordExt},
};

use crate::evaluator;

/// A caller-supplied record predicate.
pub type FilterFn<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// A caller-supplied record comparator.
pub type SortFn<'a, T> = &'a (dyn Fn(&T, &T) -> Ordering + Send + Sync);

/// A caller-supplied per-record projection applied to the final page.
pub type SelectFn<'a, T> = &'a (dyn Fn(T) -> T + Send + Sync);

/// Thread-safe in-memory record store.
///
/// `MemoryPersistence` is cloneable; clones share the same collection, configuration and
/// lifecycle state, so a store can be handed to many tasks at once.
///
/// # Example
///
/// ```ignore
/// use recordlayer_memory::MemoryPersistence;
///
/// let store = MemoryPersistence::<String>::builder()
///     .with_max_page_size(10)
///     .build();
///
/// store.open(None).await?;
/// store.create(None, "hello".to_string()).await?;
///
/// let page = store
///     .get_page_by_filter(None, Some(&|s: &String| s.starts_with('h')), None, None, None)
///     .await?;
/// assert_eq!(page.total, 1);
/// ```
pub struct MemoryPersistence<T> {
    items: Arc<Mutex<Vec<T>>>,
    loader: Option<Arc<dyn Loader<T>>>,
    saver: Option<Arc<dyn Saver<T>>>,
    max_page_size: Arc<AtomicUsize>,
    opened: Arc<AtomicBool>,
}

impl<T> Clone for MemoryPersistence<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            loader: self.loader.clone(),
            saver: self.saver.clone(),
            max_page_size: self.max_page_size.clone(),
            opened: self.opened.clone(),
        }
    }
}

impl<T> fmt::Debug for MemoryPersistence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPersistence")
            .field("max_page_size", &self.max_page_size.load(atomic::Ordering::Relaxed))
            .field("opened", &self.opened.load(atomic::Ordering::Relaxed))
            .field("has_loader", &self.loader.is_some())
            .field("has_saver", &self.saver.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> Default for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty store with no loader or saver.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for a store with a loader, saver or custom page size.
    pub fn builder() -> MemoryPersistenceBuilder<T> {
        MemoryPersistenceBuilder::default()
    }

    /// Returns the current page size clamp.
    pub fn max_page_size(&self) -> usize {
        self.max_page_size.load(atomic::Ordering::Relaxed)
    }

    /// Applies `options.max_page_size` from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Configuration`] if the value is negative or not an integer.
    /// The previous page size stays in effect.
    pub fn configure(&self, config: &ConfigParams) -> PersistenceResult<()> {
        if let Some(size) = config.get_as_integer(MAX_PAGE_SIZE_KEY)? {
            let size = usize::try_from(size).map_err(|_| {
                PersistenceError::Configuration(format!(
                    "{MAX_PAGE_SIZE_KEY} must not be negative, got {size}"
                ))
            })?;

            self.max_page_size.store(size, atomic::Ordering::Relaxed);
            debug!(max_page_size = size, "Configured memory persistence");
        }

        Ok(())
    }

    /// Returns `true` once the store has been opened and not yet closed.
    pub fn is_open(&self) -> bool {
        self.opened.load(atomic::Ordering::Acquire)
    }

    /// Loads the collection and marks the store open.
    ///
    /// Opening an already open store does nothing.
    ///
    /// # Errors
    ///
    /// Propagates loader failures; the store stays closed.
    pub async fn open(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        if self.is_open() {
            debug!(trace_id = ?trace_id, "Memory persistence is already open");
            return Ok(());
        }

        self.load(trace_id).await?;
        self.opened.store(true, atomic::Ordering::Release);
        trace!(trace_id = ?trace_id, "Opened memory persistence");

        Ok(())
    }

    /// Saves the collection and marks the store closed.
    ///
    /// The store is marked closed even when the save fails.
    ///
    /// # Errors
    ///
    /// Propagates saver failures.
    pub async fn close(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        let result = self.save(trace_id).await;
        self.opened.store(false, atomic::Ordering::Release);
        trace!(trace_id = ?trace_id, "Closed memory persistence");

        result
    }

    /// Replaces the collection with the loader's records.
    ///
    /// Without a loader this is a no-op. On loader failure the current collection is kept.
    pub async fn load(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        let Some(loader) = &self.loader else {
            return Ok(());
        };

        let count = {
            let mut items = self.items.lock().await;
            *items = loader.load(trace_id).await?;
            items.len()
        };

        trace!(trace_id = ?trace_id, "Loaded {count} items");

        Ok(())
    }

    /// Passes the current collection to the saver.
    ///
    /// Without a saver this is a no-op.
    pub async fn save(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        let Some(saver) = &self.saver else {
            return Ok(());
        };

        let count = {
            let items = self.items.lock().await;
            saver.save(trace_id, items.as_slice()).await?;
            items.len()
        };

        trace!(trace_id = ?trace_id, "Saved {count} items");

        Ok(())
    }

    /// Empties the collection, then saves.
    pub async fn clear(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.items.lock().await.clear();
        trace!(trace_id = ?trace_id, "Cleared items");

        self.save(trace_id).await
    }

    /// Appends a record, saves, and returns the stored record.
    ///
    /// No uniqueness is enforced.
    pub async fn create(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<T> {
        self.items.lock().await.push(item.clone());
        trace!(trace_id = ?trace_id, "Created an item");

        self.save(trace_id).await?;

        Ok(item)
    }

    /// Builds a record from loosely-typed fields and creates it.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] without touching the collection if the
    /// fields do not describe a valid record.
    pub async fn create_from_fields(&self, trace_id: Option<&str>, fields: FieldMap) -> PersistenceResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let item = T::from_fields(fields)?;

        self.create(trace_id, item).await
    }

    /// Returns one page of records.
    ///
    /// The pipeline is: snapshot, filter, sort, count the total, skip/take, project.
    /// See [`PagingParams`] for the window rules.
    pub async fn get_page_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
        paging: Option<PagingParams>,
        sort: Option<SortFn<'_, T>>,
        select: Option<SelectFn<'_, T>>,
    ) -> PersistenceResult<DataPage<T>> {
        let items = sort_items(filter_items(self.snapshot().await, filter), sort);
        let total = items.len();
        let data = select_items(
            paging.unwrap_or_default().apply(items, self.max_page_size()),
            select,
        );

        trace!(trace_id = ?trace_id, "Retrieved {} items", data.len());

        Ok(DataPage::new(data, total))
    }

    /// Returns every matching record, sorted and projected, without paging.
    pub async fn get_list_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
        sort: Option<SortFn<'_, T>>,
        select: Option<SelectFn<'_, T>>,
    ) -> PersistenceResult<Vec<T>> {
        let items = select_items(sort_items(filter_items(self.snapshot().await, filter), sort), select);

        trace!(trace_id = ?trace_id, "Retrieved {} items", items.len());

        Ok(items)
    }

    /// Counts the records matching `filter`.
    pub async fn get_count_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
    ) -> PersistenceResult<usize> {
        let count = filter_items(self.snapshot().await, filter).len();

        trace!(trace_id = ?trace_id, "Counted {count} items");

        Ok(count)
    }

    /// Picks one record uniformly at random among those matching `filter`.
    ///
    /// Returns `None` when nothing matches.
    pub async fn get_one_random(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
    ) -> PersistenceResult<Option<T>> {
        let mut items = filter_items(self.snapshot().await, filter);

        if items.is_empty() {
            trace!(trace_id = ?trace_id, "Nothing to return as random item");
            return Ok(None);
        }

        let index = rand::thread_rng().gen_range(0..items.len());
        trace!(trace_id = ?trace_id, "Retrieved a random item");

        Ok(Some(items.swap_remove(index)))
    }

    /// Removes every record matching `filter` and returns how many were removed.
    ///
    /// The removal is all or nothing: if `filter` panics, no record is removed. Saves only
    /// when at least one record was removed.
    pub async fn delete_by_filter(&self, trace_id: Option<&str>, filter: FilterFn<'_, T>) -> PersistenceResult<usize> {
        let deleted = {
            let mut items = self.items.lock().await;
            let matched = items.iter().map(|item| filter(item)).collect::<Vec<bool>>();
            let deleted = matched.iter().filter(|&&hit| hit).count();

            if deleted > 0 {
                let mut matched = matched.into_iter();
                items.retain(|_| !matched.next().unwrap_or(false));
            }

            deleted
        };

        trace!(trace_id = ?trace_id, "Deleted {deleted} items");

        if deleted > 0 {
            self.save(trace_id).await?;
        }

        Ok(deleted)
    }

    /// Returns one page of the records matching a structured query.
    ///
    /// Records are compared through their JSON field view. A record that cannot be serialized
    /// never matches a query with a filter or sort keys.
    pub async fn get_page_by_query(
        &self,
        trace_id: Option<&str>,
        query: Option<Query>,
        paging: Option<PagingParams>,
    ) -> PersistenceResult<DataPage<T>>
    where
        T: Serialize,
    {
        let items = run_query(self.snapshot().await, query.unwrap_or_default());
        let total = items.len();
        let data = paging.unwrap_or_default().apply(items, self.max_page_size());

        trace!(trace_id = ?trace_id, "Retrieved {} items", data.len());

        Ok(DataPage::new(data, total))
    }

    /// Returns every record matching a structured query, in query sort order.
    pub async fn get_list_by_query(&self, trace_id: Option<&str>, query: Option<Query>) -> PersistenceResult<Vec<T>>
    where
        T: Serialize,
    {
        let items = run_query(self.snapshot().await, query.unwrap_or_default());

        trace!(trace_id = ?trace_id, "Retrieved {} items", items.len());

        Ok(items)
    }

    /// Copies the collection under the lock.
    async fn snapshot(&self) -> Vec<T> {
        self.items.lock().await.clone()
    }

    /// Runs `f` against the collection while holding the lock.
    ///
    /// `f` must not call back into the store.
    pub(crate) async fn inspect<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.items.lock().await;
        f(items.as_slice())
    }

    /// Applies a structural change to the collection while holding the lock.
    ///
    /// `f` must not call back into the store.
    pub(crate) async fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut items = self.items.lock().await;
        f(&mut *items)
    }
}

fn filter_items<T>(mut items: Vec<T>, filter: Option<FilterFn<'_, T>>) -> Vec<T> {
    if let Some(filter) = filter {
        items.retain(|item| filter(item));
    }
    items
}

fn sort_items<T>(mut items: Vec<T>, sort: Option<SortFn<'_, T>>) -> Vec<T> {
    if let Some(sort) = sort {
        items.sort_by(|a, b| sort(a, b));
    }
    items
}

fn select_items<T>(items: Vec<T>, select: Option<SelectFn<'_, T>>) -> Vec<T> {
    match select {
        Some(select) => items.into_iter().map(select).collect(),
        None => items,
    }
}

fn run_query<T: Serialize>(items: Vec<T>, query: Query) -> Vec<T> {
    if query.filter.is_none() && query.sort.is_empty() {
        return items;
    }

    let mut rows = items
        .into_iter()
        .filter_map(|item| {
            let view = serde_json::to_value(&item).ok()?;
            Some((view, item))
        })
        .filter(|(view, _)| {
            query
                .filter
                .as_ref()
                .is_none_or(|expr| evaluator::matches(view, expr))
        })
        .collect::<Vec<(Value, T)>>();

    if !query.sort.is_empty() {
        rows.sort_by(|(a, _), (b, _)| evaluator::compare_by(&query.sort, a, b));
    }

    rows.into_iter().map(|(_, item)| item).collect()
}

#[async_trait]
impl<T> Openable for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn is_open(&self) -> bool {
        MemoryPersistence::is_open(self)
    }

    async fn open(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        MemoryPersistence::open(self, trace_id).await
    }

    async fn close(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        MemoryPersistence::close(self, trace_id).await
    }
}

#[async_trait]
impl<T> Cleanable for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn clear(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        MemoryPersistence::clear(self, trace_id).await
    }
}

impl<T> Configurable for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn configure(&self, config: &ConfigParams) -> PersistenceResult<()> {
        MemoryPersistence::configure(self, config)
    }
}

#[async_trait]
impl<T> QueryablePageReader<T> for MemoryPersistence<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    async fn get_page_by_query(
        &self,
        trace_id: Option<&str>,
        query: Option<Query>,
        paging: Option<PagingParams>,
    ) -> PersistenceResult<DataPage<T>> {
        MemoryPersistence::get_page_by_query(self, trace_id, query, paging).await
    }
}

/// Builder for constructing [`MemoryPersistence`] instances.
///
/// # Example
///
/// ```ignore
/// use recordlayer_memory::MemoryPersistence;
///
/// let store = MemoryPersistence::builder()
///     .with_loader(my_loader)
///     .with_saver(my_saver)
///     .with_max_page_size(50)
///     .build();
/// ```
pub struct MemoryPersistenceBuilder<T> {
    loader: Option<Arc<dyn Loader<T>>>,
    saver: Option<Arc<dyn Saver<T>>>,
    max_page_size: usize,
}

impl<T> Default for MemoryPersistenceBuilder<T> {
    fn default() -> Self {
        Self {
            loader: None,
            saver: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl<T> MemoryPersistenceBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Sets the loader used by `load` and `open`.
    pub fn with_loader(mut self, loader: impl Loader<T> + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Sets the saver used by `save`, `close` and every mutation.
    pub fn with_saver(mut self, saver: impl Saver<T> + 'static) -> Self {
        self.saver = Some(Arc::new(saver));
        self
    }

    /// Uses one component as both loader and saver.
    pub fn with_persister<P>(mut self, persister: P) -> Self
    where
        P: Loader<T> + Saver<T> + 'static,
    {
        let persister = Arc::new(persister);
        self.loader = Some(persister.clone());
        self.saver = Some(persister);
        self
    }

    /// Sets the initial page size clamp.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Builds and returns an empty, closed store.
    pub fn build(self) -> MemoryPersistence<T> {
        MemoryPersistence {
            items: Arc::new(Mutex::new(Vec::new())),
            loader: self.loader,
            saver: self.saver,
            max_page_size: Arc::new(AtomicUsize::new(self.max_page_size)),
            opened: Arc::new(AtomicBool::new(false)),
        }
    }
}
