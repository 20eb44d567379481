//! Contracts between persistence components and the code around them.
//!
//! Two groups of traits live here:
//!
//! - **Consumed** by a store: [`Loader`] hydrates the full collection from an external medium
//!   and [`Saver`] persists it. Either may be absent, in which case the store keeps its data
//!   in memory only.
//! - **Exposed** by a store to higher layers: [`Openable`], [`Cleanable`], [`Configurable`],
//!   [`Getter`], [`Writer`], [`PartialUpdater`] and [`QueryablePageReader`]. A concrete store
//!   implements whichever subset its domain needs.
//!
//! Every operation takes an optional trace id used only to correlate log output.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    config::ConfigParams,
    error::PersistenceResult,
    page::{DataPage, PagingParams},
    query::Query,
    record::FieldMap,
};

/// Produces a full collection of records from an external medium.
///
/// # Errors
///
/// Implementations report an unavailable medium as
/// [`PersistenceError::Io`](crate::error::PersistenceError::Io).
#[async_trait]
pub trait Loader<T>: Send + Sync {
    /// Loads every record.
    async fn load(&self, trace_id: Option<&str>) -> PersistenceResult<Vec<T>>;
}

/// Persists a full collection of records to an external medium.
///
/// Each call receives the complete current collection and is expected to overwrite the
/// previous contents of the medium.
#[async_trait]
pub trait Saver<T>: Send + Sync {
    /// Saves the given records, replacing whatever was saved before.
    async fn save(&self, trace_id: Option<&str>, items: &[T]) -> PersistenceResult<()>;
}

#[async_trait]
impl<T, L> Loader<T> for Arc<L>
where
    L: Loader<T> + ?Sized,
    T: Send + 'static,
{
    async fn load(&self, trace_id: Option<&str>) -> PersistenceResult<Vec<T>> {
        (**self).load(trace_id).await
    }
}

#[async_trait]
impl<T, S> Saver<T> for Arc<S>
where
    S: Saver<T> + ?Sized,
    T: Sync + 'static,
{
    async fn save(&self, trace_id: Option<&str>, items: &[T]) -> PersistenceResult<()> {
        (**self).save(trace_id, items).await
    }
}

/// Components with an explicit open/close lifecycle.
#[async_trait]
pub trait Openable: Send + Sync {
    /// Returns `true` once the component has been opened and not yet closed.
    fn is_open(&self) -> bool;

    /// Opens the component.
    async fn open(&self, trace_id: Option<&str>) -> PersistenceResult<()>;

    /// Closes the component and flushes its state.
    async fn close(&self, trace_id: Option<&str>) -> PersistenceResult<()>;
}

/// Components whose state can be wiped.
#[async_trait]
pub trait Cleanable: Send + Sync {
    /// Removes all state held by the component.
    async fn clear(&self, trace_id: Option<&str>) -> PersistenceResult<()>;
}

/// Components configured from [`ConfigParams`].
pub trait Configurable {
    /// Applies the recognized keys of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Configuration`](crate::error::PersistenceError::Configuration)
    /// for invalid values; the previous configuration stays in effect.
    fn configure(&self, config: &ConfigParams) -> PersistenceResult<()>;
}

/// Reads single records by identifier.
#[async_trait]
pub trait Getter<T, K>: Send + Sync
where
    K: Sync,
{
    /// Returns the record with the given id, or `None` if there is none.
    async fn get_one_by_id(&self, trace_id: Option<&str>, id: &K) -> PersistenceResult<Option<T>>;
}

/// Creates, replaces and deletes records.
#[async_trait]
pub trait Writer<T, K>: Send + Sync
where
    T: Send + 'static,
    K: Sync,
{
    /// Creates a record and returns it as stored.
    async fn create(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<T>;

    /// Replaces an existing record. Returns `None` without inserting if it does not exist.
    async fn update(&self, trace_id: Option<&str>, item: T) -> PersistenceResult<Option<T>>;

    /// Deletes the record with the given id and returns it, or `None` if there was none.
    async fn delete_by_id(&self, trace_id: Option<&str>, id: &K) -> PersistenceResult<Option<T>>;
}

/// Updates a subset of a record's fields.
#[async_trait]
pub trait PartialUpdater<T, K>: Send + Sync
where
    K: Sync,
{
    /// Overlays `fields` on the record with the given id and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`](crate::error::PersistenceError::NotFound) if no
    /// record has the given id.
    async fn update_partially(
        &self,
        trace_id: Option<&str>,
        id: &K,
        fields: FieldMap,
    ) -> PersistenceResult<T>;
}

/// Reads pages of records selected by a structured [`Query`].
#[async_trait]
pub trait QueryablePageReader<T>: Send + Sync {
    /// Returns one page of the records matching `query`, in query sort order.
    async fn get_page_by_query(
        &self,
        trace_id: Option<&str>,
        query: Option<Query>,
        paging: Option<PagingParams>,
    ) -> PersistenceResult<DataPage<T>>;
}
