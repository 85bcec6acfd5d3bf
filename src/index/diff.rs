//! Diff engine
//!
//! Compares two entry sets by identity. Entries whose identity exists on
//! both sides are left alone; index rows are immutable once written.

use ahash::AHashSet;
use std::hash::Hash;

/// Entries to remove from and add to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDiff<E> {
    pub to_add: Vec<E>,
    pub to_delete: Vec<E>,
}

impl<E> EntryDiff<E> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }
}

impl<E> Default for EntryDiff<E> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

/// Compute the entries present only in `previous` (delete) or only in `next` (add)
///
/// Output keeps input order; repeated identities on one side are reported once.
pub fn diff<E, K, F>(previous: Vec<E>, next: Vec<E>, identity: F) -> EntryDiff<E>
where
    K: Eq + Hash,
    F: Fn(&E) -> K,
{
    let previous_ids: AHashSet<K> = previous.iter().map(&identity).collect();
    let next_ids: AHashSet<K> = next.iter().map(&identity).collect();

    let to_delete = only_in(previous, &next_ids, &identity);
    let to_add = only_in(next, &previous_ids, &identity);

    EntryDiff { to_add, to_delete }
}

fn only_in<E, K, F>(entries: Vec<E>, other: &AHashSet<K>, identity: &F) -> Vec<E>
where
    K: Eq + Hash,
    F: Fn(&E) -> K,
{
    let mut emitted = AHashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let id = identity(entry);
            !other.contains(&id) && emitted.insert(id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RangeIndexEntry, TermIndexEntry};

    fn term(key: &str, doc: &str) -> TermIndexEntry {
        TermIndexEntry {
            term_key: key.to_string(),
            doc_id: doc.to_string(),
        }
    }

    #[test]
    fn test_add_and_delete() {
        let previous = vec![term("category=shoes", "d1"), term("tags~red", "d1"), term("tags~blue", "d1")];
        let next = vec![term("category=boots", "d1"), term("tags~blue", "d1")];

        let d = diff(previous, next, TermIndexEntry::identity);

        assert_eq!(d.to_delete, vec![term("category=shoes", "d1"), term("tags~red", "d1")]);
        assert_eq!(d.to_add, vec![term("category=boots", "d1")]);
    }

    #[test]
    fn test_identical_sets_empty() {
        let entries = vec![term("a", "d"), term("b", "d")];
        let d = diff(entries.clone(), entries, TermIndexEntry::identity);
        assert!(d.is_empty());
    }

    #[test]
    fn test_from_empty() {
        let d = diff(Vec::new(), vec![term("a", "d")], TermIndexEntry::identity);
        assert_eq!(d.to_add.len(), 1);
        assert!(d.to_delete.is_empty());
    }

    #[test]
    fn test_duplicates_reported_once() {
        let d = diff(Vec::new(), vec![term("a", "d"), term("a", "d")], TermIndexEntry::identity);
        assert_eq!(d.to_add.len(), 1);
    }

    #[test]
    fn test_range_identity() {
        let old = RangeIndexEntry {
            field: "price".to_string(),
            range_key: "n1\u{0}d".to_string(),
            doc_id: "d".to_string(),
        };
        let new = RangeIndexEntry {
            range_key: "n2\u{0}d".to_string(),
            ..old.clone()
        };

        let d = diff(vec![old.clone()], vec![new.clone()], RangeIndexEntry::identity);
        assert_eq!(d.to_delete, vec![old]);
        assert_eq!(d.to_add, vec![new]);
    }
}
