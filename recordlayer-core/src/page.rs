//! Paging parameters and result pages.
//!
//! [`PagingParams`] describe a contiguous `skip`/`take` window over an ordered result set
//! and [`DataPage`] carries one such window together with the total number of matches.
//!
//! Window rules:
//!
//! - a missing or non-positive `skip` means "do not skip";
//! - a missing `take` defaults to the store's maximum page size, and a larger `take` is
//!   clamped to it;
//! - a non-positive `take` (after clamping) means "no limit".

use serde::{Deserialize, Serialize};

/// Default upper bound on the number of items returned in one page.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// A single page of query results.
///
/// `total` counts every item that matched the filter before the page window was applied.
///
/// # Example
///
/// ```ignore
/// use recordlayer_core::page::DataPage;
///
/// let page = DataPage::new(vec!["a", "b"], 10);
/// assert_eq!(page.items.len(), 2);
/// assert_eq!(page.total, 10);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataPage<T> {
    /// The items in this page, in result order.
    pub items: Vec<T>,
    /// Number of matching items before paging.
    pub total: usize,
}

impl<T> DataPage<T> {
    /// Creates a page from its items and the pre-paging match count.
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }

    /// Returns `true` if this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for DataPage<T> {
    fn default() -> Self {
        Self { items: Vec::new(), total: 0 }
    }
}

/// Parameters selecting a window of an ordered result set.
///
/// # Example
///
/// ```ignore
/// use recordlayer_core::page::PagingParams;
///
/// let paging = PagingParams::builder().with_skip(20).with_take(10).build();
/// let window = paging.apply((0..100).collect::<Vec<_>>(), 100);
/// assert_eq!(window, (20..30).collect::<Vec<_>>());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PagingParams {
    /// Number of items to skip from the start of the result set.
    pub skip: Option<i64>,
    /// Maximum number of items to return.
    pub take: Option<i64>,
}

impl PagingParams {
    /// Creates new paging parameters.
    pub fn new(skip: Option<i64>, take: Option<i64>) -> Self {
        Self { skip, take }
    }

    /// Creates a new builder for constructing paging parameters.
    pub fn builder() -> PagingParamsBuilder {
        PagingParamsBuilder::new()
    }

    /// Returns the requested skip, or `default` when none was given.
    pub fn skip_or(&self, default: i64) -> i64 {
        self.skip.unwrap_or(default)
    }

    /// Returns the requested take clamped to `max_take`, or `max_take` when none was given.
    ///
    /// Negative requests collapse to `0`, which [`PagingParams::apply`] reads as "no limit".
    pub fn take_or(&self, max_take: i64) -> i64 {
        match self.take {
            None => max_take,
            Some(take) if take < 0 => 0,
            Some(take) => take.min(max_take),
        }
    }

    /// Cuts the page window out of `items`.
    ///
    /// # Arguments
    ///
    /// * `items` - The full, already filtered and sorted result set
    /// * `max_page_size` - The store's page size clamp
    pub fn apply<T>(&self, items: Vec<T>, max_page_size: usize) -> Vec<T> {
        let max_take = i64::try_from(max_page_size).unwrap_or(i64::MAX);
        let skip = self.skip_or(-1);
        let take = self.take_or(max_take);

        let window = items.into_iter().skip(usize::try_from(skip).unwrap_or(0));

        match usize::try_from(take) {
            Ok(take) if take > 0 => window.take(take).collect(),
            _ => window.collect(),
        }
    }
}

/// Builder for constructing [`PagingParams`] instances.
#[derive(Default)]
pub struct PagingParamsBuilder {
    skip: Option<i64>,
    take: Option<i64>,
}

impl PagingParamsBuilder {
    /// Creates a new builder with no parameters set.
    pub fn new() -> Self {
        Self { skip: None, take: None }
    }

    /// Sets the number of items to skip.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of items to return.
    pub fn with_take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Builds and returns the [`PagingParams`].
    pub fn build(self) -> PagingParams {
        PagingParams { skip: self.skip, take: self.take }
    }
}
