//! fieldex - structured-field secondary indexes
//!
//! Maintains term (`eq` / `contains`) and range (`between` / `gte` / `lte`)
//! indexes over typed document fields kept in an external key-value store,
//! and answers single-predicate lookups with cursor pagination.
//!
//! ## Architecture
//! - Types: `WhereValue` scalars, `DocFields` records, index entry rows
//! - Index layer: value codec → normalizer → entry builder → diff → writer; reader
//! - Storage layer: `IndexBackend` seam, `KvBackend` over any `KvStore` client
//!   (chunked batch writes with bounded retry, cursor codec), in-memory store
//!
//! The engine keeps no global state: backends and clients are owned by the
//! caller and passed in at construction.

pub mod config;
pub mod types;
pub mod index;
pub mod storage;

mod error;
mod api;

pub use api::FieldIndex;
pub use config::{IndexConfig, RetryPolicy};
pub use error::{IndexError, Result};
pub use index::{CancelToken, IndexReader, IndexWriter, WriteStats};
pub use storage::{IndexBackend, KvBackend, KvStore, MemoryKvStore};
pub use types::{
    DocFields, DocId, FieldValue, QueryOptions, QueryPage, RangeIndexEntry, TermIndexEntry,
    TermMode, ValueKind, WhereValue,
};
