//! Identity-addressed record store.
//!
//! [`IdentifiableMemoryPersistence`] layers id-based access over [`MemoryPersistence`]: every
//! stored record carries an identifier, records created without one get a generated id, and
//! records can be read, replaced, partially updated and deleted by id.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use tracing::trace;

use recordlayer_core::{
    config::ConfigParams,
    contract::{
        Cleanable, Configurable, Getter, Loader, Openable, PartialUpdater, QueryablePageReader,
        Saver, Writer,
    },
    error::{PersistenceError, PersistenceResult},
    page::{DataPage, PagingParams},
    query::Query,
    record::{FieldMap, Identifiable, Identifier, RecordExt},
};

use crate::persistence::{
    FilterFn, MemoryPersistence, MemoryPersistenceBuilder, SelectFn, SortFn,
};

/// Thread-safe in-memory store of [`Identifiable`] records.
///
/// Clones share state with the original, just like [`MemoryPersistence`].
///
/// # Example
///
/// ```ignore
/// use recordlayer_memory::IdentifiableMemoryPersistence;
///
/// let store = IdentifiableMemoryPersistence::<Dummy>::new();
/// store.open(None).await?;
///
/// let created = store
///     .create(None, Dummy { id: None, key: "Key 1".into(), content: "Content 1".into() })
///     .await?;
/// let id = created.id.clone().unwrap();
///
/// assert!(store.get_one_by_id(None, &id).await?.is_some());
/// assert!(store.delete_by_id(None, &id).await?.is_some());
/// assert!(store.get_one_by_id(None, &id).await?.is_none());
/// ```
#[derive(Debug)]
pub struct IdentifiableMemoryPersistence<T> {
    base: MemoryPersistence<T>,
}

impl<T> Clone for IdentifiableMemoryPersistence<T> {
    fn clone(&self) -> Self {
        Self { base: self.base.clone() }
    }
}

impl<T> From<MemoryPersistence<T>> for IdentifiableMemoryPersistence<T> {
    fn from(base: MemoryPersistence<T>) -> Self {
        Self { base }
    }
}

impl<T> Default for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    /// Creates an empty store with no loader or saver.
    pub fn new() -> Self {
        Self::from(MemoryPersistence::new())
    }

    /// Creates a builder for a store with a loader, saver or custom page size.
    pub fn builder() -> IdentifiableMemoryPersistenceBuilder<T> {
        IdentifiableMemoryPersistenceBuilder::default()
    }

    /// See [`MemoryPersistence::max_page_size`].
    pub fn max_page_size(&self) -> usize {
        self.base.max_page_size()
    }

    /// See [`MemoryPersistence::configure`].
    pub fn configure(&self, config: &ConfigParams) -> PersistenceResult<()> {
        self.base.configure(config)
    }

    /// See [`MemoryPersistence::is_open`].
    pub fn is_open(&self) -> bool {
        self.base.is_open()
    }

    /// See [`MemoryPersistence::open`].
    pub async fn open(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.base.open(trace_id).await
    }

    /// See [`MemoryPersistence::close`].
    pub async fn close(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.base.close(trace_id).await
    }

    /// See [`MemoryPersistence::load`].
    pub async fn load(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.base.load(trace_id).await
    }

    /// See [`MemoryPersistence::save`].
    pub async fn save(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.base.save(trace_id).await
    }

    /// See [`MemoryPersistence::clear`].
    pub async fn clear(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        self.base.clear(trace_id).await
    }

    /// See [`MemoryPersistence::get_page_by_filter`].
    pub async fn get_page_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
        paging: Option<PagingParams>,
        sort: Option<SortFn<'_, T>>,
        select: Option<SelectFn<'_, T>>,
    ) -> PersistenceResult<DataPage<T>> {
        self.base.get_page_by_filter(trace_id, filter, paging, sort, select).await
    }

    /// See [`MemoryPersistence::get_list_by_filter`].
    pub async fn get_list_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
        sort: Option<SortFn<'_, T>>,
        select: Option<SelectFn<'_, T>>,
    ) -> PersistenceResult<Vec<T>> {
        self.base.get_list_by_filter(trace_id, filter, sort, select).await
    }

    /// See [`MemoryPersistence::get_count_by_filter`].
    pub async fn get_count_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
    ) -> PersistenceResult<usize> {
        self.base.get_count_by_filter(trace_id, filter).await
    }

    /// See [`MemoryPersistence::get_one_random`].
    pub async fn get_one_random(
        &self,
        trace_id: Option<&str>,
        filter: Option<FilterFn<'_, T>>,
    ) -> PersistenceResult<Option<T>> {
        self.base.get_one_random(trace_id, filter).await
    }

    /// See [`MemoryPersistence::delete_by_filter`].
    pub async fn delete_by_filter(&self, trace_id: Option<&str>, filter: FilterFn<'_, T>) -> PersistenceResult<usize> {
        self.base.delete_by_filter(trace_id, filter).await
    }

    /// See [`MemoryPersistence::get_page_by_query`].
    pub async fn get_page_by_query(
        &self,
        trace_id: Option<&str>,
        query: Option<Query>,
        paging: Option<PagingParams>,
    ) -> PersistenceResult<DataPage<T>>
    where
        T: Serialize,
    {
        self.base.get_page_by_query(trace_id, query, paging).await
    }

    /// See [`MemoryPersistence::get_list_by_query`].
    pub async fn get_list_by_query(&self, trace_id: Option<&str>, query: Option<Query>) -> PersistenceResult<Vec<T>>
    where
        T: Serialize,
    {
        self.base.get_list_by_query(trace_id, query).await
    }

    /// Returns the record with the given id, or `None` if there is none.
    pub async fn get_one_by_id(&self, trace_id: Option<&str>, id: &T::Id) -> PersistenceResult<Option<T>> {
        let item = self
            .base
            .inspect(|items| items.iter().find(|item| item.has_id(id)).cloned())
            .await;

        match &item {
            Some(_) => trace!(trace_id = ?trace_id, "Retrieved item by {id}"),
            None => trace!(trace_id = ?trace_id, "Cannot find item by {id}"),
        }

        Ok(item)
    }

    /// Returns the records whose id is among `ids`.
    ///
    /// Results follow store order, not the order of `ids`. Unknown ids are ignored.
    pub async fn get_list_by_ids(&self, trace_id: Option<&str>, ids: &[T::Id]) -> PersistenceResult<Vec<T>> {
        let wanted = ids.iter().collect::<HashSet<_>>();

        let items = self
            .base
            .inspect(|items| {
                items
                    .iter()
                    .filter(|item| item.id().is_some_and(|id| wanted.contains(id)))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;

        trace!(trace_id = ?trace_id, "Retrieved {} items", items.len());

        Ok(items)
    }

    /// Creates a record, assigning a generated id when it has none or a blank one.
    pub async fn create(&self, trace_id: Option<&str>, mut item: T) -> PersistenceResult<T> {
        if item.id().is_none_or(Identifier::is_blank) {
            item.set_id(T::Id::generate());
        }

        self.base.create(trace_id, item).await
    }

    /// Builds a record from loosely-typed fields and creates it.
    pub async fn create_from_fields(&self, trace_id: Option<&str>, fields: FieldMap) -> PersistenceResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let item = T::from_fields(fields)?;

        self.create(trace_id, item).await
    }

    /// Replaces the stored record that has `item`'s id.
    ///
    /// Returns `None` without touching the collection or saving when `item` has no id or no
    /// record carries it.
    pub async fn update(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<Option<T>> {
        let Some(id) = item.id().cloned() else {
            trace!(trace_id = ?trace_id, "Cannot update an item without id");
            return Ok(None);
        };

        let replaced = self
            .base
            .mutate(|items| match items.iter().position(|stored| stored.has_id(&id)) {
                Some(index) => {
                    items[index] = item.clone();
                    true
                }
                None => false,
            })
            .await;

        if !replaced {
            trace!(trace_id = ?trace_id, "Cannot find item by {id}");
            return Ok(None);
        }

        trace!(trace_id = ?trace_id, "Updated item {id}");
        self.base.save(trace_id).await?;

        Ok(Some(item))
    }

    /// Overlays `fields` on the record with the given id and returns the updated record.
    ///
    /// The id itself is never changed by the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if no record carries `id`, or a serialization
    /// error if the merged fields no longer form a valid record. In both cases the collection
    /// is unchanged.
    pub async fn update_partially(
        &self,
        trace_id: Option<&str>,
        id: &T::Id,
        fields: FieldMap,
    ) -> PersistenceResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let updated = self
            .base
            .mutate(|items| -> PersistenceResult<Option<T>> {
                let Some(index) = items.iter().position(|item| item.has_id(id)) else {
                    return Ok(None);
                };

                let mut merged = items[index].merge_fields(&fields)?;
                merged.set_id(id.clone());
                items[index] = merged.clone();

                Ok(Some(merged))
            })
            .await?;

        let Some(updated) = updated else {
            trace!(trace_id = ?trace_id, "Cannot find item by {id}");
            return Err(PersistenceError::NotFound(id.to_string()));
        };

        trace!(trace_id = ?trace_id, "Partially updated item {id}");
        self.base.save(trace_id).await?;

        Ok(updated)
    }

    /// Deletes the record with the given id and returns it.
    ///
    /// Returns `None` and skips the save when no record carries `id`.
    pub async fn delete_by_id(&self, trace_id: Option<&str>, id: &T::Id) -> PersistenceResult<Option<T>> {
        let removed = self
            .base
            .mutate(|items| {
                items
                    .iter()
                    .position(|item| item.has_id(id))
                    .map(|index| items.remove(index))
            })
            .await;

        if removed.is_none() {
            trace!(trace_id = ?trace_id, "Cannot find item by {id}");
            return Ok(None);
        }

        trace!(trace_id = ?trace_id, "Deleted item by {id}");
        self.base.save(trace_id).await?;

        Ok(removed)
    }

    /// Deletes every record whose id is among `ids` and returns how many were removed.
    pub async fn delete_by_ids(&self, trace_id: Option<&str>, ids: &[T::Id]) -> PersistenceResult<usize> {
        let wanted = ids.iter().cloned().collect::<HashSet<_>>();
        let filter = move |item: &T| item.id().is_some_and(|id| wanted.contains(id));

        self.base.delete_by_filter(trace_id, &filter).await
    }
}

#[async_trait]
impl<T> Getter<T, T::Id> for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn get_one_by_id(&self, trace_id: Option<&str>, id: &T::Id) -> PersistenceResult<Option<T>> {
        IdentifiableMemoryPersistence::get_one_by_id(self, trace_id, id).await
    }
}

#[async_trait]
impl<T> Writer<T, T::Id> for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn create(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<T> {
        IdentifiableMemoryPersistence::create(self, trace_id, item).await
    }

    async fn update(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<Option<T>> {
        IdentifiableMemoryPersistence::update(self, trace_id, item).await
    }

    async fn delete_by_id(&self, trace_id: Option<&str>, id: &T::Id) -> PersistenceResult<Option<T>> {
        IdentifiableMemoryPersistence::delete_by_id(self, trace_id, id).await
    }
}

#[async_trait]
impl<T> PartialUpdater<T, T::Id> for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn update_partially(
        &self,
        trace_id: Option<&str>,
        id: &T::Id,
        fields: FieldMap,
    ) -> PersistenceResult<T> {
        IdentifiableMemoryPersistence::update_partially(self, trace_id, id, fields).await
    }
}

#[async_trait]
impl<T> QueryablePageReader<T> for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Serialize + Clone + Send + Sync + 'static,
{
    async fn get_page_by_query(
        &self,
        trace_id: Option<&str>,
        query: Option<Query>,
        paging: Option<PagingParams>,
    ) -> PersistenceResult<DataPage<T>> {
        IdentifiableMemoryPersistence::get_page_by_query(self, trace_id, query, paging).await
    }
}

#[async_trait]
impl<T> Openable for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    fn is_open(&self) -> bool {
        IdentifiableMemoryPersistence::is_open(self)
    }

    async fn open(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        IdentifiableMemoryPersistence::open(self, trace_id).await
    }

    async fn close(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        IdentifiableMemoryPersistence::close(self, trace_id).await
    }
}

#[async_trait]
impl<T> Cleanable for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn clear(&self, trace_id: Option<&str>) -> PersistenceResult<()> {
        IdentifiableMemoryPersistence::clear(self, trace_id).await
    }
}

impl<T> Configurable for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    fn configure(&self, config: &ConfigParams) -> PersistenceResult<()> {
        IdentifiableMemoryPersistence::configure(self, config)
    }
}

/// Builder for constructing [`IdentifiableMemoryPersistence`] instances.
pub struct IdentifiableMemoryPersistenceBuilder<T> {
    inner: MemoryPersistenceBuilder<T>,
}

impl<T> Default for IdentifiableMemoryPersistenceBuilder<T> {
    fn default() -> Self {
        Self { inner: MemoryPersistenceBuilder::default() }
    }
}

impl<T> IdentifiableMemoryPersistenceBuilder<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    /// Sets the source `open` and `load` read the collection from.
    pub fn with_loader(self, loader: impl Loader<T> + 'static) -> Self {
        Self { inner: self.inner.with_loader(loader) }
    }

    /// Sets the sink every mutation and `close` write the collection to.
    pub fn with_saver(self, saver: impl Saver<T> + 'static) -> Self {
        Self { inner: self.inner.with_saver(saver) }
    }

    /// Uses one value as both loader and saver.
    pub fn with_persister<P>(self, persister: P) -> Self
    where
        P: Loader<T> + Saver<T> + 'static,
    {
        Self { inner: self.inner.with_persister(persister) }
    }

    /// Overrides the default cap on page size.
    pub fn with_max_page_size(self, max_page_size: usize) -> Self {
        Self { inner: self.inner.with_max_page_size(max_page_size) }
    }

    /// Finishes the store. It starts closed and empty.
    pub fn build(self) -> IdentifiableMemoryPersistence<T> {
        IdentifiableMemoryPersistence::from(self.inner.build())
    }
}
