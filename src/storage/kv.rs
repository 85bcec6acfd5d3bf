//! Low-level key-value store contract
//!
//! The minimum a backend must offer: point get/put/delete, sorted scan of
//! one partition constrained on the sort key, and batch writes that may
//! leave part of the batch unprocessed.

use crate::error::Result;
use crate::types::{DocFields, DocId, RangeIndexEntry, TermIndexEntry};
use serde::{Deserialize, Serialize};

/// Logical tables kept by the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    /// pk = term key, sk = doc id
    Terms,
    /// pk = field, sk = range key
    Ranges,
    /// pk = doc id, no sort key
    DocFields,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Terms, Table::Ranges, Table::DocFields];

    pub fn name(self) -> &'static str {
        match self {
            Table::Terms => "terms",
            Table::Ranges => "ranges",
            Table::DocFields => "doc_fields",
        }
    }
}

/// Primary key of an item: partition plus sort key
///
/// Ordering is partition first, then sort key, matching scan order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key of a doc-fields record (no sort key)
    pub fn doc(doc_id: &str) -> Self {
        Self::new(doc_id, "")
    }
}

/// Stored item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Term(TermIndexEntry),
    Range(RangeIndexEntry),
    Doc { doc_id: DocId, fields: DocFields },
}

impl Item {
    pub fn table(&self) -> Table {
        match self {
            Item::Term(_) => Table::Terms,
            Item::Range(_) => Table::Ranges,
            Item::Doc { .. } => Table::DocFields,
        }
    }

    pub fn key(&self) -> ItemKey {
        match self {
            Item::Term(e) => ItemKey::new(e.term_key.clone(), e.doc_id.clone()),
            Item::Range(e) => ItemKey::new(e.field.clone(), e.range_key.clone()),
            Item::Doc { doc_id, .. } => ItemKey::doc(doc_id),
        }
    }

    pub fn doc_id(&self) -> &str {
        match self {
            Item::Term(e) => &e.doc_id,
            Item::Range(e) => &e.doc_id,
            Item::Doc { doc_id, .. } => doc_id,
        }
    }
}

/// One request of a batch write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteRequest {
    Put { table: Table, item: Item },
    Delete { table: Table, key: ItemKey },
}

impl WriteRequest {
    pub fn put(item: Item) -> Self {
        WriteRequest::Put {
            table: item.table(),
            item,
        }
    }

    pub fn delete(table: Table, key: ItemKey) -> Self {
        WriteRequest::Delete { table, key }
    }

    pub fn table(&self) -> Table {
        match self {
            WriteRequest::Put { table, .. } | WriteRequest::Delete { table, .. } => *table,
        }
    }
}

/// Inclusive sort-key interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyRange {
    pub lower: String,
    pub upper: String,
}

impl SortKeyRange {
    pub fn new(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn contains(&self, sort: &str) -> bool {
        self.lower.as_str() <= sort && sort <= self.upper.as_str()
    }
}

/// Scan of a single partition in sort-key order
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    pub table: Table,
    pub partition: &'a str,
    /// `None` scans the whole partition
    pub sort_range: Option<SortKeyRange>,
    /// Resume strictly after this key
    pub exclusive_start: Option<ItemKey>,
    pub limit: usize,
}

/// Result of a partition scan
///
/// `last_evaluated_key` is set when the scan stopped at `limit` with more
/// matching items left.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<ItemKey>,
}

/// Caller-owned key-value client
pub trait KvStore: Send + Sync {
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Item>>;

    fn put(&self, table: Table, item: Item) -> Result<()>;

    fn delete(&self, table: Table, key: &ItemKey) -> Result<()>;

    fn query(&self, request: ScanRequest<'_>) -> Result<ScanOutput>;

    /// Apply a batch; returns the requests the store did not process
    fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>>;
}
