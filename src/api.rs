//! fieldex public API
//!
//! [`FieldIndex`] bundles the writer and the reader over one backend.

use crate::config::IndexConfig;
use crate::index::{CancelToken, IndexReader, IndexWriter, RangeQuery, TermQuery, WriteStats};
use crate::storage::{IndexBackend, KvBackend, KvStore, MemoryKvStore};
use crate::types::DocFields;
use crate::Result;
use std::sync::Arc;

/// Structured-field index over a pluggable backend
///
/// # Quick start
///
/// ```
/// use fieldex::{DocFields, FieldIndex, IndexConfig, QueryOptions};
///
/// let index = FieldIndex::in_memory(IndexConfig::default())?;
///
/// let doc = DocFields::new()
///     .with("category", "shoes")
///     .with("tags", vec!["red", "blue"])
///     .with("price", 42);
/// index.write("doc-1", &doc)?;
///
/// let page = index.terms().eq("category", "shoes", &QueryOptions::new())?;
/// assert_eq!(page.candidate_ids, vec!["doc-1"]);
///
/// let page = index.ranges().between("price", 40, 50, &QueryOptions::new())?;
/// assert_eq!(page.candidate_ids, vec!["doc-1"]);
/// # Ok::<(), fieldex::IndexError>(())
/// ```
///
/// # Operations
///
/// ## Writes
/// - `write()`: replace a document's field record and its index entries
/// - `delete()`: drop a document's entries and field record
/// - `*_with_cancel()`: same, stopping at the next backend call once cancelled
///
/// ## Queries
/// - `terms().eq()` / `terms().contains()` / `terms().query()`
/// - `ranges().between()` / `ranges().gte()` / `ranges().lte()`
pub struct FieldIndex<B: IndexBackend + ?Sized> {
    backend: Arc<B>,
    writer: IndexWriter<B>,
    reader: IndexReader<B>,
    config: IndexConfig,
}

impl FieldIndex<KvBackend<MemoryKvStore>> {
    /// Index backed by a fresh in-memory store
    pub fn in_memory(config: IndexConfig) -> Result<Self> {
        Self::with_store(Arc::new(MemoryKvStore::new()), config)
    }
}

impl<S: KvStore + ?Sized> FieldIndex<KvBackend<S>> {
    /// Index over a caller-owned key-value client
    pub fn with_store(store: Arc<S>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(KvBackend::new(store, &config));
        Self::new(backend, config)
    }
}

impl<B: IndexBackend + ?Sized> FieldIndex<B> {
    // ============================================================================
    // Construction
    // ============================================================================

    pub fn new(backend: Arc<B>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            writer: IndexWriter::new(Arc::clone(&backend)),
            reader: IndexReader::new(Arc::clone(&backend), config.default_query_limit),
            backend,
            config,
        })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    // ============================================================================
    // Writes
    // ============================================================================

    pub fn write(&self, doc_id: &str, fields: &DocFields) -> Result<WriteStats> {
        self.writer.write(doc_id, fields)
    }

    pub fn write_with_cancel(
        &self,
        doc_id: &str,
        fields: &DocFields,
        cancel: &CancelToken,
    ) -> Result<WriteStats> {
        self.writer.write_with_cancel(doc_id, fields, cancel)
    }

    pub fn delete(&self, doc_id: &str) -> Result<WriteStats> {
        self.writer.delete(doc_id)
    }

    pub fn delete_with_cancel(&self, doc_id: &str, cancel: &CancelToken) -> Result<WriteStats> {
        self.writer.delete_with_cancel(doc_id, cancel)
    }

    /// Stored field record of a document
    pub fn doc_fields(&self, doc_id: &str) -> Result<Option<DocFields>> {
        self.backend.load_doc_fields(doc_id)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub fn terms(&self) -> TermQuery<'_, B> {
        self.reader.terms()
    }

    pub fn ranges(&self) -> RangeQuery<'_, B> {
        self.reader.ranges()
    }

    pub fn writer(&self) -> &IndexWriter<B> {
        &self.writer
    }

    pub fn reader(&self) -> &IndexReader<B> {
        &self.reader
    }
}
