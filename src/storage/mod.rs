//! Storage layer
//!
//! [`IndexBackend`] is the seam between the index engine and storage.
//! [`KvBackend`] implements it over any [`KvStore`] client; the client is
//! created and owned by the caller and handed in at construction.

pub mod kv;
pub mod batch;
pub mod cursor;
pub mod memory;
pub mod snapshot;
mod backend;

pub use backend::KvBackend;
pub use batch::{submit_batches, BatchStats};
pub use cursor::{decode_cursor, encode_cursor};
pub use kv::{Item, ItemKey, KvStore, ScanOutput, ScanRequest, SortKeyRange, Table, WriteRequest};
pub use memory::{MemoryKvStore, MemoryStoreConfig, StoreOp, StoreStats};
pub use snapshot::{load_snapshot, save_snapshot};

use crate::error::Result;
use crate::types::{DocFields, QueryPage, RangeIndexEntry, TermIndexEntry};

/// Storage primitives the writer and reader are built on
///
/// Implementations must be safe to share between threads; the engine issues
/// calls sequentially per operation but different operations may overlap.
pub trait IndexBackend: Send + Sync {
    /// Stored field record of a document, `None` before its first write
    fn load_doc_fields(&self, doc_id: &str) -> Result<Option<DocFields>>;

    fn put_doc_fields(&self, doc_id: &str, fields: &DocFields) -> Result<()>;

    fn delete_doc_fields(&self, doc_id: &str) -> Result<()>;

    fn put_term_entries(&self, entries: &[TermIndexEntry]) -> Result<()>;

    fn delete_term_entries(&self, entries: &[TermIndexEntry]) -> Result<()>;

    fn put_range_entries(&self, entries: &[RangeIndexEntry]) -> Result<()>;

    fn delete_range_entries(&self, entries: &[RangeIndexEntry]) -> Result<()>;

    /// One page of doc ids under a term key
    fn scan_terms(&self, term_key: &str, cursor: Option<&str>, limit: usize) -> Result<QueryPage>;

    /// One page of doc ids in a field's range partition, sort keys within `range`
    fn scan_ranges(
        &self,
        field: &str,
        range: SortKeyRange,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<QueryPage>;
}
