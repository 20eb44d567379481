//! Main recordlayer crate providing a unified interface for in-memory record persistence.
//!
//! This crate is the primary entry point for users of recordlayer. It re-exports the core
//! types from `recordlayer-core` and the stores from `recordlayer-memory`.
//!
//! # Features
//!
//! - **Typed records** - Any `Clone` type can be stored; serde types also get field-based
//!   construction, partial updates and structured queries
//! - **Pluggable persistence** - Bring your own [`Loader`](contract::Loader) and
//!   [`Saver`](contract::Saver) to synchronize the collection with a file or other medium
//! - **Snapshot-consistent queries** - Filter, sort, page, count and random pick
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::IdentifiableMemoryPersistence};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Dummy {
//!     pub id: Option<String>,
//!     pub key: String,
//!     pub content: String,
//! }
//!
//! impl Identifiable for Dummy {
//!     type Id = String;
//!
//!     fn id(&self) -> Option<&String> { self.id.as_ref() }
//!     fn set_id(&mut self, id: String) { self.id = Some(id); }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = IdentifiableMemoryPersistence::<Dummy>::new();
//!     store.open(None).await.unwrap();
//!
//!     let created = store
//!         .create(None, Dummy { id: None, key: "Key 1".into(), content: "Content 1".into() })
//!         .await
//!         .unwrap();
//!
//!     // Query by structured filter
//!     let page = store
//!         .get_page_by_query(
//!             None,
//!             Some(Query::builder().filter(Filter::eq("key", "Key 1")).build()),
//!             None,
//!         )
//!         .await
//!         .unwrap();
//!     assert_eq!(page.total, 1);
//!
//!     // Partially update by id
//!     let fields = serde_json::json!({ "content": "X" }).as_object().cloned().unwrap();
//!     let updated = store
//!         .update_partially(None, created.id.as_ref().unwrap(), fields)
//!         .await
//!         .unwrap();
//!     assert_eq!(updated.key, "Key 1");
//!
//!     store.close(None).await.unwrap();
//! }
//! ```
//!
//! # Persisting
//!
//! Stores call their loader once on `open` and their saver after every mutation and on
//! `close`, always with the complete collection:
//!
//! ```ignore
//! use recordlayer::prelude::*;
//!
//! struct JsonFilePersister {
//!     path: std::path::PathBuf,
//! }
//!
//! #[async_trait::async_trait]
//! impl Loader<Dummy> for JsonFilePersister {
//!     async fn load(&self, _trace_id: Option<&str>) -> PersistenceResult<Vec<Dummy>> {
//!         let data = std::fs::read(&self.path)?;
//!         Ok(serde_json::from_slice(&data)?)
//!     }
//! }
//!
//! #[async_trait::async_trait]
//! impl Saver<Dummy> for JsonFilePersister {
//!     async fn save(&self, _trace_id: Option<&str>, items: &[Dummy]) -> PersistenceResult<()> {
//!         std::fs::write(&self.path, serde_json::to_vec(items)?)?;
//!         Ok(())
//!     }
//! }
//!
//! let store = IdentifiableMemoryPersistence::<Dummy>::builder()
//!     .with_persister(JsonFilePersister { path: "dummies.json".into() })
//!     .build();
//! ```

pub mod prelude;

pub use recordlayer_core::{config, contract, error, page, query, record};

// Re-export serde_json for building field maps and filter values
pub use serde_json;

/// In-memory store implementations.
pub mod memory {
    pub use recordlayer_memory::{
        FilterFn, IdentifiableMemoryPersistence, IdentifiableMemoryPersistenceBuilder,
        MemoryPersistence, MemoryPersistenceBuilder, SelectFn, SortFn,
    };
}
