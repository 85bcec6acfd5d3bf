//! [`IndexBackend`] over a [`KvStore`] client
//!
//! Table layout:
//! - terms: pk = term key, sk = doc id
//! - ranges: pk = field, sk = range key (encoded value + separator + doc id)
//! - doc_fields: pk = doc id, the normalized record embedded in the item

use super::batch::submit_batches;
use super::cursor::{decode_cursor, encode_cursor};
use super::kv::{Item, ItemKey, KvStore, ScanRequest, SortKeyRange, Table, WriteRequest};
use super::IndexBackend;
use crate::config::{IndexConfig, RetryPolicy};
use crate::error::{IndexError, Result};
use crate::types::{DocFields, QueryPage, RangeIndexEntry, TermIndexEntry};
use std::sync::Arc;
use tracing::debug;

pub struct KvBackend<S: KvStore + ?Sized> {
    store: Arc<S>,
    max_batch_size: usize,
    retry: RetryPolicy,
}

impl<S: KvStore + ?Sized> KvBackend<S> {
    pub fn new(store: Arc<S>, config: &IndexConfig) -> Self {
        Self {
            store,
            max_batch_size: config.max_batch_size,
            retry: config.retry,
        }
    }

    /// The caller-owned client this backend writes through
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn submit(&self, what: &str, requests: Vec<WriteRequest>) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }
        let count = requests.len();
        let stats = submit_batches(self.store.as_ref(), requests, self.max_batch_size, &self.retry)?;
        debug!(
            what,
            count,
            chunks = stats.chunks,
            submissions = stats.submissions,
            "batch applied"
        );
        Ok(())
    }

    /// Decode a cursor and make sure it was issued for `partition`
    fn resume_key(cursor: Option<&str>, partition: &str) -> Result<Option<ItemKey>> {
        let Some(token) = cursor else {
            return Ok(None);
        };
        let key = decode_cursor(token)?;
        if key.partition != partition {
            return Err(IndexError::InvalidCursor(
                "cursor belongs to a different query".to_string(),
            ));
        }
        Ok(Some(key))
    }

    fn scan(
        &self,
        table: Table,
        partition: &str,
        sort_range: Option<SortKeyRange>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<QueryPage> {
        let exclusive_start = Self::resume_key(cursor, partition)?;

        let output = self.store.query(ScanRequest {
            table,
            partition,
            sort_range,
            exclusive_start,
            limit,
        })?;

        let candidate_ids = output
            .items
            .iter()
            .map(|item| item.doc_id().to_string())
            .collect();
        let cursor = output
            .last_evaluated_key
            .as_ref()
            .map(encode_cursor)
            .transpose()?;

        Ok(QueryPage { candidate_ids, cursor })
    }
}

impl<S: KvStore + ?Sized> IndexBackend for KvBackend<S> {
    fn load_doc_fields(&self, doc_id: &str) -> Result<Option<DocFields>> {
        match self.store.get(Table::DocFields, &ItemKey::doc(doc_id))? {
            None => Ok(None),
            Some(Item::Doc { fields, .. }) => Ok(Some(fields)),
            Some(other) => Err(IndexError::Corruption(format!(
                "doc_fields row for {:?} holds a {} item",
                doc_id,
                other.table().name()
            ))),
        }
    }

    fn put_doc_fields(&self, doc_id: &str, fields: &DocFields) -> Result<()> {
        self.store.put(
            Table::DocFields,
            Item::Doc {
                doc_id: doc_id.to_string(),
                fields: fields.clone(),
            },
        )
    }

    fn delete_doc_fields(&self, doc_id: &str) -> Result<()> {
        self.store.delete(Table::DocFields, &ItemKey::doc(doc_id))
    }

    fn put_term_entries(&self, entries: &[TermIndexEntry]) -> Result<()> {
        let requests = entries
            .iter()
            .map(|e| WriteRequest::put(Item::Term(e.clone())))
            .collect();
        self.submit("put terms", requests)
    }

    fn delete_term_entries(&self, entries: &[TermIndexEntry]) -> Result<()> {
        let requests = entries
            .iter()
            .map(|e| WriteRequest::delete(Table::Terms, ItemKey::new(e.term_key.clone(), e.doc_id.clone())))
            .collect();
        self.submit("delete terms", requests)
    }

    fn put_range_entries(&self, entries: &[RangeIndexEntry]) -> Result<()> {
        let requests = entries
            .iter()
            .map(|e| WriteRequest::put(Item::Range(e.clone())))
            .collect();
        self.submit("put ranges", requests)
    }

    fn delete_range_entries(&self, entries: &[RangeIndexEntry]) -> Result<()> {
        let requests = entries
            .iter()
            .map(|e| WriteRequest::delete(Table::Ranges, ItemKey::new(e.field.clone(), e.range_key.clone())))
            .collect();
        self.submit("delete ranges", requests)
    }

    fn scan_terms(&self, term_key: &str, cursor: Option<&str>, limit: usize) -> Result<QueryPage> {
        self.scan(Table::Terms, term_key, None, cursor, limit)
    }

    fn scan_ranges(
        &self,
        field: &str,
        range: SortKeyRange,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<QueryPage> {
        self.scan(Table::Ranges, field, Some(range), cursor, limit)
    }
}
