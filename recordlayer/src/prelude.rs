//! Convenient re-exports of commonly used types from recordlayer.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use recordlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record and identifier traits
//! - Loader, saver and store capability contracts
//! - Query construction and paging
//! - Configuration and error types

pub use recordlayer_core::{
    config::{ConfigParams, MAX_PAGE_SIZE_KEY},
    contract::{Cleanable, Configurable, Getter, Loader, Openable, PartialUpdater, QueryablePageReader, Saver, Writer},
    error::{PersistenceError, PersistenceResult},
    page::{DataPage, PagingParams, PagingParamsBuilder, DEFAULT_MAX_PAGE_SIZE},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, SortDirection, SortField},
    record::{FieldMap, ID_FIELD, Identifiable, Identifier, RecordExt},
};
