//! Snapshot files for the in-memory store
//!
//! Layout (little endian):
//! ```text
//! | magic "FDXS" | version u32 | crc32 u32 | payload len u64 | payload |
//! ```
//! The payload is JSON (the field records use untagged enums, which need a
//! self-describing format). The CRC covers the payload only.

use crate::error::{IndexError, Result};
use crate::storage::kv::{Item, Table};
use crate::storage::memory::{MemoryKvStore, MemoryStoreConfig, MemoryTables};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

const MAGIC: &[u8; 4] = b"FDXS";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    config: MemoryStoreConfig,
    tables: Vec<(Table, Vec<Item>)>,
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Write every table of `store` to `path` (atomically via a temp file)
pub fn save_snapshot<P: AsRef<Path>>(store: &MemoryKvStore, path: P) -> Result<()> {
    let path = path.as_ref();

    let data = store.with_tables(|tables| SnapshotData {
        config: store.config(),
        tables: Table::ALL
            .iter()
            .map(|t| (*t, tables.table(*t).values().cloned().collect()))
            .collect(),
    });
    let payload = serde_json::to_vec(&data)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&checksum(&payload).to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), bytes = buf.len(), "store snapshot written");
    Ok(())
}

/// Rebuild a store from a file written by [`save_snapshot`]
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<MemoryKvStore> {
    let path = path.as_ref();
    let buf = fs::read(path)?;

    if buf.len() < HEADER_LEN {
        return Err(IndexError::Corruption(format!(
            "snapshot {} too short ({} bytes)",
            path.display(),
            buf.len()
        )));
    }
    if &buf[0..4] != MAGIC {
        return Err(IndexError::Corruption(format!("snapshot {} has bad magic", path.display())));
    }

    let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    if version != VERSION {
        return Err(IndexError::Corruption(format!(
            "snapshot {} has unsupported version {}",
            path.display(),
            version
        )));
    }

    let expected = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&buf[12..20]);
    let len = u64::from_le_bytes(len_bytes) as usize;

    let payload = &buf[HEADER_LEN..];
    if payload.len() != len {
        return Err(IndexError::Corruption(format!(
            "snapshot {} payload length mismatch: header {} vs actual {}",
            path.display(),
            len,
            payload.len()
        )));
    }

    let actual = checksum(payload);
    if actual != expected {
        return Err(IndexError::Corruption(format!(
            "snapshot {} checksum mismatch: expected {:08x}, got {:08x}",
            path.display(),
            expected,
            actual
        )));
    }

    let data: SnapshotData = serde_json::from_slice(payload)?;
    let mut tables = MemoryTables::default();
    for (table, items) in data.tables {
        for item in items {
            tables.insert(table, item)?;
        }
    }

    debug!(path = %path.display(), "store snapshot loaded");
    Ok(MemoryKvStore::from_tables(tables, data.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{ItemKey, KvStore};
    use crate::types::{DocFields, TermIndexEntry};
    use tempfile::TempDir;

    fn populated() -> MemoryKvStore {
        let store = MemoryKvStore::new();
        store
            .put(
                Table::Terms,
                Item::Term(TermIndexEntry {
                    term_key: "8:category#eq#sshoes".to_string(),
                    doc_id: "doc-1".to_string(),
                }),
            )
            .unwrap();
        store
            .put(
                Table::DocFields,
                Item::Doc {
                    doc_id: "doc-1".to_string(),
                    fields: DocFields::new().with("category", "shoes").with("tags", vec!["a"]),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("store.snap");

        let store = populated();
        save_snapshot(&store, &path)?;
        let loaded = load_snapshot(&path)?;

        assert_eq!(loaded.items(Table::Terms), store.items(Table::Terms));
        assert_eq!(
            loaded.get(Table::DocFields, &ItemKey::doc("doc-1"))?,
            store.get(Table::DocFields, &ItemKey::doc("doc-1"))?
        );
        Ok(())
    }

    #[test]
    fn test_corruption_detected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("store.snap");
        save_snapshot(&populated(), &path)?;

        let mut bytes = fs::read(&path)?;
        let last = bytes.len() - 2;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes)?;

        assert!(matches!(load_snapshot(&path), Err(IndexError::Corruption(_))));
        Ok(())
    }

    #[test]
    fn test_truncated_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("short.snap");
        fs::write(&path, b"FDXS")?;

        assert!(matches!(load_snapshot(&path), Err(IndexError::Corruption(_))));
        Ok(())
    }
}
