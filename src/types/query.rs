//! Query options and result pages

use super::DocId;
use serde::{Deserialize, Serialize};

/// Pagination options shared by term and range queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Continuation token returned by the previous page
    pub cursor: Option<String>,
    /// Maximum ids per page (falls back to the configured default)
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Options for the page following `page`, or `None` when `page` was the last one
    pub fn next_page(&self, page: &QueryPage) -> Option<Self> {
        page.cursor.as_ref().map(|cursor| Self {
            cursor: Some(cursor.clone()),
            limit: self.limit,
        })
    }
}

/// One page of candidate document ids
///
/// A missing `cursor` means there are no further pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    pub candidate_ids: Vec<DocId>,
    pub cursor: Option<String>,
}

impl QueryPage {
    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}
