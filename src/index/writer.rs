//! Index writer
//!
//! `write(doc_id, fields)` brings the term and range indexes in line with a
//! document's new field record:
//!
//! 1. normalize the incoming record
//! 2. load and normalize the stored record (empty before the first write)
//! 3. build entries for both states
//! 4. diff terms and ranges independently
//! 5. delete stale term entries, then stale range entries
//! 6. put new term entries, then new range entries
//! 7. store the normalized record as the document's current state
//!
//! Any failure aborts the remaining steps. Calls already issued stay applied;
//! nothing is rolled back. Writes to the same document must be serialized by
//! the caller.

use crate::error::{IndexError, Result};
use crate::index::builder::IndexEntries;
use crate::index::codec::check_reserved_chars;
use crate::index::diff::{diff, EntryDiff};
use crate::index::normalize::normalize;
use crate::storage::IndexBackend;
use crate::types::{DocFields, RangeIndexEntry, TermIndexEntry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Caller-driven cancellation flag
///
/// Checked before every backend call of a write; once set, the write stops
/// with [`IndexError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self, next_step: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(IndexError::Cancelled(next_step));
        }
        Ok(())
    }
}

/// Entry counts applied by one write or delete
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub terms_deleted: usize,
    pub ranges_deleted: usize,
    pub terms_added: usize,
    pub ranges_added: usize,
}

impl WriteStats {
    /// True when the index needed no change
    pub fn is_noop(&self) -> bool {
        *self == WriteStats::default()
    }
}

pub struct IndexWriter<B: IndexBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: IndexBackend + ?Sized> Clone for IndexWriter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: IndexBackend + ?Sized> IndexWriter<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Replace the indexed field record of `doc_id` with `fields`
    pub fn write(&self, doc_id: &str, fields: &DocFields) -> Result<WriteStats> {
        self.write_with_cancel(doc_id, fields, &CancelToken::new())
    }

    pub fn write_with_cancel(
        &self,
        doc_id: &str,
        fields: &DocFields,
        cancel: &CancelToken,
    ) -> Result<WriteStats> {
        validate_doc_id(doc_id)?;

        // Build the new entries first so unsupported values fail before any I/O
        let next = normalize(fields);
        let next_entries = IndexEntries::build(doc_id, &next)?;

        cancel.check("load_doc_fields")?;
        let previous = match self.backend.load_doc_fields(doc_id)? {
            Some(stored) => normalize(&stored),
            None => DocFields::new(),
        };
        let previous_entries = IndexEntries::build(doc_id, &previous)?;

        let stats = self.apply(doc_id, previous_entries, next_entries, cancel)?;

        cancel.check("put_doc_fields")?;
        self.backend.put_doc_fields(doc_id, &next)?;

        Ok(stats)
    }

    /// Remove every entry of `doc_id` and its stored field record
    ///
    /// Unknown documents are a no-op.
    pub fn delete(&self, doc_id: &str) -> Result<WriteStats> {
        self.delete_with_cancel(doc_id, &CancelToken::new())
    }

    pub fn delete_with_cancel(&self, doc_id: &str, cancel: &CancelToken) -> Result<WriteStats> {
        validate_doc_id(doc_id)?;

        cancel.check("load_doc_fields")?;
        let Some(stored) = self.backend.load_doc_fields(doc_id)? else {
            debug!(doc_id, "delete of unindexed document");
            return Ok(WriteStats::default());
        };
        let previous_entries = IndexEntries::build(doc_id, &normalize(&stored))?;

        let stats = self.apply(doc_id, previous_entries, IndexEntries::default(), cancel)?;

        cancel.check("delete_doc_fields")?;
        self.backend.delete_doc_fields(doc_id)?;

        Ok(stats)
    }

    fn apply(
        &self,
        doc_id: &str,
        previous: IndexEntries,
        next: IndexEntries,
        cancel: &CancelToken,
    ) -> Result<WriteStats> {
        let terms: EntryDiff<TermIndexEntry> =
            diff(previous.terms, next.terms, TermIndexEntry::identity);
        let ranges: EntryDiff<RangeIndexEntry> =
            diff(previous.ranges, next.ranges, RangeIndexEntry::identity);

        debug!(
            doc_id,
            terms_delete = terms.to_delete.len(),
            ranges_delete = ranges.to_delete.len(),
            terms_add = terms.to_add.len(),
            ranges_add = ranges.to_add.len(),
            "index diff"
        );

        if !terms.to_delete.is_empty() {
            cancel.check("delete_term_entries")?;
            self.backend.delete_term_entries(&terms.to_delete)?;
        }
        if !ranges.to_delete.is_empty() {
            cancel.check("delete_range_entries")?;
            self.backend.delete_range_entries(&ranges.to_delete)?;
        }
        if !terms.to_add.is_empty() {
            cancel.check("put_term_entries")?;
            self.backend.put_term_entries(&terms.to_add)?;
        }
        if !ranges.to_add.is_empty() {
            cancel.check("put_range_entries")?;
            self.backend.put_range_entries(&ranges.to_add)?;
        }

        Ok(WriteStats {
            terms_deleted: terms.to_delete.len(),
            ranges_deleted: ranges.to_delete.len(),
            terms_added: terms.to_add.len(),
            ranges_added: ranges.to_add.len(),
        })
    }
}

fn validate_doc_id(doc_id: &str) -> Result<()> {
    if doc_id.is_empty() {
        return Err(IndexError::InvalidArgument("doc id must not be empty".to_string()));
    }
    check_reserved_chars(doc_id, "doc id").map_err(|e| match e {
        IndexError::UnsupportedValue(msg) => IndexError::InvalidArgument(msg),
        other => other,
    })
}
