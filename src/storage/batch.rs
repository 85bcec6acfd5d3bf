//! Chunked batch submission
//!
//! Splits write requests into chunks no larger than the store's batch
//! ceiling, and resubmits whatever the store reports as unprocessed until the
//! chunk drains or the retry policy runs out.

use crate::config::RetryPolicy;
use crate::error::{IndexError, Result};
use crate::storage::kv::{KvStore, WriteRequest};
use tracing::{trace, warn};

/// Counters for one `submit_batches` call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Chunks the requests were split into
    pub chunks: usize,
    /// `batch_write` calls issued, resubmissions included
    pub submissions: usize,
    /// Requests sent again after being reported unprocessed
    pub resubmitted: usize,
}

pub fn submit_batches<S: KvStore + ?Sized>(
    store: &S,
    requests: Vec<WriteRequest>,
    max_batch_size: usize,
    retry: &RetryPolicy,
) -> Result<BatchStats> {
    if max_batch_size == 0 {
        return Err(IndexError::InvalidArgument(
            "max_batch_size must be at least 1".to_string(),
        ));
    }

    let mut stats = BatchStats::default();
    let mut remaining = requests.into_iter();

    loop {
        let chunk: Vec<WriteRequest> = remaining.by_ref().take(max_batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        stats.chunks += 1;
        drain_chunk(store, chunk, retry, &mut stats)?;
    }

    Ok(stats)
}

fn drain_chunk<S: KvStore + ?Sized>(
    store: &S,
    chunk: Vec<WriteRequest>,
    retry: &RetryPolicy,
    stats: &mut BatchStats,
) -> Result<()> {
    let mut pending = chunk;
    let mut attempts = 0u32;

    loop {
        let sent = pending.len();
        attempts += 1;
        stats.submissions += 1;
        trace!(sent, attempt = attempts, "submitting batch");

        let unprocessed = store.batch_write(pending)?;
        if unprocessed.is_empty() {
            return Ok(());
        }
        if unprocessed.len() > sent {
            return Err(IndexError::Backend(format!(
                "store reported {} unprocessed requests for a batch of {}",
                unprocessed.len(),
                sent
            )));
        }
        if attempts >= retry.max_attempts {
            return Err(IndexError::UnprocessedItems {
                remaining: unprocessed.len(),
                attempts,
            });
        }

        let delay = retry.backoff_for(attempts);
        warn!(
            unprocessed = unprocessed.len(),
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "batch partially processed, resubmitting"
        );
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        stats.resubmitted += unprocessed.len();
        pending = unprocessed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{Item, Table};
    use crate::storage::memory::{MemoryKvStore, StoreOp};
    use crate::types::TermIndexEntry;

    fn puts(n: usize) -> Vec<WriteRequest> {
        (0..n)
            .map(|i| {
                WriteRequest::put(Item::Term(TermIndexEntry {
                    term_key: "k".to_string(),
                    doc_id: format!("doc-{:03}", i),
                }))
            })
            .collect()
    }

    #[test]
    fn test_chunks_respect_ceiling() -> Result<()> {
        let store = MemoryKvStore::new();
        let stats = submit_batches(&store, puts(60), 25, &RetryPolicy::immediate(3))?;

        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.submissions, 3);
        assert_eq!(store.len(Table::Terms), 60);
        Ok(())
    }

    #[test]
    fn test_unprocessed_resubmitted() -> Result<()> {
        let store = MemoryKvStore::new();
        store.defer_unprocessed(2, 5);

        let stats = submit_batches(&store, puts(10), 25, &RetryPolicy::immediate(5))?;

        assert_eq!(stats.submissions, 3);
        assert_eq!(stats.resubmitted, 10);
        assert_eq!(store.len(Table::Terms), 10);
        Ok(())
    }

    #[test]
    fn test_retry_budget_exhausted() {
        let store = MemoryKvStore::new();
        store.defer_unprocessed(100, 1);

        let err = submit_batches(&store, puts(3), 25, &RetryPolicy::immediate(4)).unwrap_err();
        match err {
            IndexError::UnprocessedItems { remaining, attempts } => {
                assert_eq!(remaining, 1);
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Everything but the deferred request was applied
        assert_eq!(store.len(Table::Terms), 2);
    }

    #[test]
    fn test_store_failure_propagates() {
        let store = MemoryKvStore::new();
        store.fail_next(StoreOp::BatchWrite);

        let err = submit_batches(&store, puts(2), 25, &RetryPolicy::immediate(4)).unwrap_err();
        assert!(matches!(err, IndexError::Backend(_)));
        assert_eq!(store.len(Table::Terms), 0);
    }

    #[test]
    fn test_empty_is_noop() -> Result<()> {
        let store = MemoryKvStore::new();
        let stats = submit_batches(&store, Vec::new(), 25, &RetryPolicy::default())?;
        assert_eq!(stats, BatchStats::default());
        assert_eq!(store.stats().batch_writes, 0);
        Ok(())
    }
}
