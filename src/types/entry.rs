//! Index entry records

use super::DocId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup mode of a term entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMode {
    /// Exact match on a scalar field
    Eq,
    /// Membership in an array field
    Contains,
}

impl TermMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TermMode::Eq => "eq",
            TermMode::Contains => "contains",
        }
    }
}

impl fmt::Display for TermMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Term index row: partition = `term_key`, sort = `doc_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermIndexEntry {
    pub term_key: String,
    pub doc_id: DocId,
}

impl TermIndexEntry {
    /// Diff identity: one row per (term, document)
    pub fn identity(&self) -> (String, DocId) {
        (self.term_key.clone(), self.doc_id.clone())
    }
}

/// Range index row: partition = `field`, sort = `range_key`
///
/// `range_key` already embeds the document id after the value separator, so
/// `(field, range_key)` is unique per document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeIndexEntry {
    pub field: String,
    pub range_key: String,
    pub doc_id: DocId,
}

impl RangeIndexEntry {
    pub fn identity(&self) -> (String, String) {
        (self.field.clone(), self.range_key.clone())
    }
}
