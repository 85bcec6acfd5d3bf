//! Index layer
//!
//! Pipeline for a write: normalize → build entries → diff → apply via the
//! backend. Reads go straight to the backend's partition scans.

pub mod codec;
pub mod normalize;
pub mod builder;
pub mod diff;
pub mod writer;
pub mod reader;

pub use builder::{build_range_entries, build_term_entries, IndexEntries};
pub use codec::{
    build_range_key, build_term_key, range_lower_bound, range_upper_bound, serialize,
    KEY_SEPARATOR, MAX_SENTINEL,
};
pub use diff::{diff, EntryDiff};
pub use normalize::normalize;
pub use reader::{IndexReader, RangeQuery, TermQuery};
pub use writer::{CancelToken, IndexWriter, WriteStats};
