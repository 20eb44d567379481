//! Core types for an in-memory record persistence layer.
//!
//! This crate is the foundation of the recordlayer project and provides:
//!
//! - **Records** ([`record`]) - Identifier traits and the JSON field view of records
//! - **Contracts** ([`contract`]) - Loader/saver traits consumed by stores and the capability
//!   traits stores expose to higher layers
//! - **Structured queries** ([`query`]) - Typed filter expressions and sort keys
//! - **Paging** ([`page`]) - Paging parameters and result pages
//! - **Configuration** ([`config`]) - Dotted-key configuration parameters
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use recordlayer_core::record::Identifiable;
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
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_core;

pub mod config;
pub mod contract;
pub mod error;
pub mod page;
pub mod query;
pub mod record;
