//! In-memory record persistence for recordlayer.
//!
//! This crate provides two thread-safe stores over an in-memory collection:
//!
//! - [`MemoryPersistence`] - a generic store answering filter/sort/paging queries over
//!   snapshots of its collection, with optional whole-collection load/save synchronization
//! - [`IdentifiableMemoryPersistence`] - the same store addressed by record identifiers, with
//!   id-based get/update/delete, batch variants and partial field updates
//!
//! # Features
//!
//! - **Snapshot reads** - Caller-supplied filters and comparators never run under the store lock
//! - **Save after every mutation** - Mutations are followed by a save of the full collection
//! - **Structured queries** - [`Query`](recordlayer_core::query::Query) filters evaluated over
//!   each record's JSON fields
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer_core::record::Identifiable;
//! use recordlayer_memory::IdentifiableMemoryPersistence;
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
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = IdentifiableMemoryPersistence::<Dummy>::builder()
//!         .with_persister(my_file_persister)
//!         .build();
//!
//!     store.open(None).await?;
//!     store
//!         .create(None, Dummy { id: None, key: "Key 1".into(), content: "Content 1".into() })
//!         .await?;
//!     store.close(None).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_memory;

mod evaluator;
pub mod identifiable;
pub mod persistence;

pub use identifiable::{IdentifiableMemoryPersistence, IdentifiableMemoryPersistenceBuilder};
pub use persistence::{FilterFn, MemoryPersistence, MemoryPersistenceBuilder, SelectFn, SortFn};
