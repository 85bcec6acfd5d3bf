//! In-memory key-value store
//!
//! Reference implementation of [`KvStore`]: one ordered map per table,
//! guarded by a single `RwLock`. Mirrors the behaviour of a hosted
//! key-value service closely enough to exercise the index end to end:
//! - batch writes above the configured ceiling are rejected
//! - scans stop at `limit` and report the last evaluated key
//! - unprocessed batch items and call failures can be injected for tests

use crate::config::DEFAULT_MAX_BATCH_SIZE;
use crate::error::{IndexError, Result};
use crate::storage::kv::{
    Item, ItemKey, KvStore, ScanOutput, ScanRequest, Table, WriteRequest,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

/// Memory store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Largest batch accepted by `batch_write`
    pub max_batch_size: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Put,
    Delete,
    Query,
    BatchWrite,
}

/// Call counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub gets: u64,
    pub puts: u64,
    pub deletes: u64,
    pub queries: u64,
    pub batch_writes: u64,
    /// Requests applied through `batch_write`
    pub batch_items: u64,
}

#[derive(Default)]
struct Counters {
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    queries: AtomicU64,
    batch_writes: AtomicU64,
    batch_items: AtomicU64,
}

#[derive(Debug, Default)]
struct FaultPlan {
    /// Remaining batch calls that leave their tail unprocessed
    deferred_rounds: u32,
    /// Requests left unprocessed per affected batch
    deferred_per_batch: usize,
    /// (operation, successful calls still allowed before failing)
    failures: Vec<(StoreOp, u32)>,
}

pub(crate) type TableMap = BTreeMap<ItemKey, Item>;

#[derive(Debug, Default)]
pub(crate) struct MemoryTables {
    pub(crate) terms: TableMap,
    pub(crate) ranges: TableMap,
    pub(crate) docs: TableMap,
}

impl MemoryTables {
    pub(crate) fn table(&self, table: Table) -> &TableMap {
        match table {
            Table::Terms => &self.terms,
            Table::Ranges => &self.ranges,
            Table::DocFields => &self.docs,
        }
    }

    pub(crate) fn table_mut(&mut self, table: Table) -> &mut TableMap {
        match table {
            Table::Terms => &mut self.terms,
            Table::Ranges => &mut self.ranges,
            Table::DocFields => &mut self.docs,
        }
    }

    /// Insert after checking the item belongs to `table`
    pub(crate) fn insert(&mut self, table: Table, item: Item) -> Result<()> {
        if item.table() != table {
            return Err(IndexError::InvalidArgument(format!(
                "item for table '{}' written to table '{}'",
                item.table().name(),
                table.name()
            )));
        }
        self.table_mut(table).insert(item.key(), item);
        Ok(())
    }
}

/// In-memory [`KvStore`]
pub struct MemoryKvStore {
    tables: RwLock<MemoryTables>,
    config: MemoryStoreConfig,
    faults: Mutex<FaultPlan>,
    counters: Counters,
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            tables: RwLock::new(MemoryTables::default()),
            config,
            faults: Mutex::new(FaultPlan::default()),
            counters: Counters::default(),
        }
    }

    pub(crate) fn from_tables(tables: MemoryTables, config: MemoryStoreConfig) -> Self {
        Self {
            tables: RwLock::new(tables),
            ..Self::with_config(config)
        }
    }

    pub fn config(&self) -> MemoryStoreConfig {
        self.config
    }

    /// Number of items in `table`
    pub fn len(&self, table: Table) -> usize {
        self.tables.read().table(table).len()
    }

    pub fn is_empty(&self) -> bool {
        let tables = self.tables.read();
        Table::ALL.iter().all(|t| tables.table(*t).is_empty())
    }

    /// Copy of every item in `table`, in key order
    pub fn items(&self, table: Table) -> Vec<Item> {
        self.tables.read().table(table).values().cloned().collect()
    }

    pub fn stats(&self) -> StoreStats {
        let c = &self.counters;
        StoreStats {
            gets: c.gets.load(Ordering::Relaxed),
            puts: c.puts.load(Ordering::Relaxed),
            deletes: c.deletes.load(Ordering::Relaxed),
            queries: c.queries.load(Ordering::Relaxed),
            batch_writes: c.batch_writes.load(Ordering::Relaxed),
            batch_items: c.batch_items.load(Ordering::Relaxed),
        }
    }

    /// Make the next `rounds` batch writes leave their last `per_batch`
    /// requests unprocessed
    pub fn defer_unprocessed(&self, rounds: u32, per_batch: usize) {
        let mut faults = self.faults.lock();
        faults.deferred_rounds = rounds;
        faults.deferred_per_batch = per_batch;
    }

    /// Make the next call of `op` fail with a backend error
    pub fn fail_next(&self, op: StoreOp) {
        self.fail_after(op, 0);
    }

    /// Let `skip` calls of `op` succeed, then fail the one after
    pub fn fail_after(&self, op: StoreOp, skip: u32) {
        self.faults.lock().failures.push((op, skip));
    }

    pub(crate) fn with_tables<R>(&self, f: impl FnOnce(&MemoryTables) -> R) -> R {
        f(&self.tables.read())
    }

    fn check_fault(&self, op: StoreOp) -> Result<()> {
        let mut faults = self.faults.lock();
        let Some(pos) = faults.failures.iter().position(|(o, _)| *o == op) else {
            return Ok(());
        };
        if faults.failures[pos].1 > 0 {
            faults.failures[pos].1 -= 1;
            return Ok(());
        }
        faults.failures.remove(pos);
        Err(IndexError::Backend(format!("injected failure on {:?}", op)))
    }

    /// How many trailing requests of the current batch to leave unprocessed
    fn take_deferred(&self, batch_len: usize) -> usize {
        let mut faults = self.faults.lock();
        if faults.deferred_rounds == 0 {
            return 0;
        }
        faults.deferred_rounds -= 1;
        faults.deferred_per_batch.min(batch_len)
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Item>> {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        self.check_fault(StoreOp::Get)?;
        Ok(self.tables.read().table(table).get(key).cloned())
    }

    fn put(&self, table: Table, item: Item) -> Result<()> {
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        self.check_fault(StoreOp::Put)?;
        self.tables.write().insert(table, item)
    }

    fn delete(&self, table: Table, key: &ItemKey) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.check_fault(StoreOp::Delete)?;
        self.tables.write().table_mut(table).remove(key);
        Ok(())
    }

    fn query(&self, request: ScanRequest<'_>) -> Result<ScanOutput> {
        self.counters.queries.fetch_add(1, Ordering::Relaxed);
        self.check_fault(StoreOp::Query)?;

        if request.limit == 0 {
            return Err(IndexError::InvalidArgument("scan limit must be at least 1".to_string()));
        }

        let lower = ItemKey::new(
            request.partition,
            request
                .sort_range
                .as_ref()
                .map(|r| r.lower.clone())
                .unwrap_or_default(),
        );
        let start = match request.exclusive_start {
            Some(key) if key >= lower => Bound::Excluded(key),
            _ => Bound::Included(lower),
        };

        let tables = self.tables.read();
        let mut matched: Vec<(&ItemKey, &Item)> = tables
            .table(request.table)
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| {
                key.partition == request.partition
                    && request
                        .sort_range
                        .as_ref()
                        .map_or(true, |r| key.sort.as_str() <= r.upper.as_str())
            })
            .take(request.limit.saturating_add(1))
            .collect();

        let mut output = ScanOutput::default();
        if matched.len() > request.limit {
            matched.truncate(request.limit);
            output.last_evaluated_key = matched.last().map(|(key, _)| (*key).clone());
        }
        output.items = matched.into_iter().map(|(_, item)| item.clone()).collect();

        Ok(output)
    }

    fn batch_write(&self, mut requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>> {
        self.counters.batch_writes.fetch_add(1, Ordering::Relaxed);
        self.check_fault(StoreOp::BatchWrite)?;

        if requests.len() > self.config.max_batch_size {
            return Err(IndexError::Backend(format!(
                "batch of {} requests exceeds limit of {}",
                requests.len(),
                self.config.max_batch_size
            )));
        }

        let deferred = self.take_deferred(requests.len());
        let unprocessed = requests.split_off(requests.len() - deferred);

        let mut tables = self.tables.write();
        for request in requests {
            match request {
                WriteRequest::Put { table, item } => tables.insert(table, item)?,
                WriteRequest::Delete { table, key } => {
                    tables.table_mut(table).remove(&key);
                }
            }
            self.counters.batch_items.fetch_add(1, Ordering::Relaxed);
        }

        Ok(unprocessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::SortKeyRange;
    use crate::types::RangeIndexEntry;

    fn range_item(field: &str, sort: &str) -> Item {
        Item::Range(RangeIndexEntry {
            field: field.to_string(),
            range_key: sort.to_string(),
            doc_id: sort.to_string(),
        })
    }

    fn seeded() -> MemoryKvStore {
        let store = MemoryKvStore::new();
        for sort in ["a", "b", "c", "d"] {
            store.put(Table::Ranges, range_item("f", sort)).unwrap();
        }
        store.put(Table::Ranges, range_item("g", "a")).unwrap();
        store
    }

    fn scan(store: &MemoryKvStore, range: Option<SortKeyRange>, start: Option<ItemKey>, limit: usize) -> ScanOutput {
        store
            .query(ScanRequest {
                table: Table::Ranges,
                partition: "f",
                sort_range: range,
                exclusive_start: start,
                limit,
            })
            .unwrap()
    }

    fn sorts(output: &ScanOutput) -> Vec<&str> {
        output.items.iter().map(|i| i.doc_id()).collect()
    }

    #[test]
    fn test_scan_stays_in_partition() {
        let store = seeded();
        let out = scan(&store, None, None, 10);
        assert_eq!(sorts(&out), vec!["a", "b", "c", "d"]);
        assert!(out.last_evaluated_key.is_none());
    }

    #[test]
    fn test_scan_sort_range_inclusive() {
        let store = seeded();
        let out = scan(&store, Some(SortKeyRange::new("b", "c")), None, 10);
        assert_eq!(sorts(&out), vec!["b", "c"]);
    }

    #[test]
    fn test_scan_pages() {
        let store = seeded();
        let first = scan(&store, None, None, 3);
        assert_eq!(sorts(&first), vec!["a", "b", "c"]);
        assert_eq!(first.last_evaluated_key, Some(ItemKey::new("f", "c")));

        let second = scan(&store, None, first.last_evaluated_key.clone(), 3);
        assert_eq!(sorts(&second), vec!["d"]);
        assert!(second.last_evaluated_key.is_none());
    }

    #[test]
    fn test_exact_limit_has_no_cursor() {
        let store = seeded();
        let out = scan(&store, None, None, 4);
        assert_eq!(out.items.len(), 4);
        assert!(out.last_evaluated_key.is_none());
    }

    #[test]
    fn test_unbounded_limit_returns_everything() {
        let store = seeded();
        let out = scan(&store, None, None, usize::MAX);
        assert_eq!(sorts(&out), vec!["a", "b", "c", "d"]);
        assert!(out.last_evaluated_key.is_none());
    }

    #[test]
    fn test_batch_ceiling() {
        let store = MemoryKvStore::with_config(MemoryStoreConfig { max_batch_size: 2 });
        let requests = vec![
            WriteRequest::put(range_item("f", "a")),
            WriteRequest::put(range_item("f", "b")),
            WriteRequest::put(range_item("f", "c")),
        ];
        assert!(matches!(store.batch_write(requests), Err(IndexError::Backend(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_batch_put_and_delete() -> Result<()> {
        let store = seeded();
        let unprocessed = store.batch_write(vec![
            WriteRequest::delete(Table::Ranges, ItemKey::new("f", "a")),
            WriteRequest::put(range_item("f", "e")),
        ])?;

        assert!(unprocessed.is_empty());
        assert_eq!(sorts(&scan(&store, None, None, 10)), vec!["b", "c", "d", "e"]);
        assert_eq!(store.stats().batch_items, 2);
        Ok(())
    }

    #[test]
    fn test_wrong_table_rejected() {
        let store = MemoryKvStore::new();
        assert!(store.put(Table::Terms, range_item("f", "a")).is_err());
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let store = MemoryKvStore::new();
        store.fail_next(StoreOp::Get);
        assert!(store.get(Table::Terms, &ItemKey::doc("x")).is_err());
        assert!(store.get(Table::Terms, &ItemKey::doc("x")).is_ok());
    }
}
