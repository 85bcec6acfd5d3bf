//! Value and record types for structured document fields

mod fields;
mod entry;
mod query;

pub use fields::{DocFields, FieldValue};
pub use entry::{RangeIndexEntry, TermIndexEntry, TermMode};
pub use query::{QueryOptions, QueryPage};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Caller-assigned document identifier (never generated by the engine)
pub type DocId = String;

/// Scalar value usable in a `where` predicate
///
/// Values of the same kind are totally ordered; across kinds the order is
/// `Bool < Number < Text`, which matches the order of their encoded keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhereValue {
    /// Boolean value
    Bool(bool),

    /// Numeric value (integers are stored as f64)
    Number(f64),

    /// Text string
    Text(String),
}

/// Discriminant of a [`WhereValue`], used to keep encoded kinds apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Bool,
    Number,
    Text,
}

impl ValueKind {
    /// Single-character tag prefixed to every encoded value of this kind
    pub fn tag(self) -> char {
        match self {
            ValueKind::Bool => 'b',
            ValueKind::Number => 'n',
            ValueKind::Text => 's',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
        }
    }
}

impl WhereValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            WhereValue::Bool(_) => ValueKind::Bool,
            WhereValue::Number(_) => ValueKind::Number,
            WhereValue::Text(_) => ValueKind::Text,
        }
    }

    /// Number with negative zero folded into positive zero
    fn canonical_number(n: f64) -> f64 {
        if n == 0.0 {
            0.0
        } else {
            n
        }
    }
}

impl PartialEq for WhereValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WhereValue {}

impl PartialOrd for WhereValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WhereValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (WhereValue::Bool(a), WhereValue::Bool(b)) => a.cmp(b),
            (WhereValue::Number(a), WhereValue::Number(b)) => {
                Self::canonical_number(*a).total_cmp(&Self::canonical_number(*b))
            }
            (WhereValue::Text(a), WhereValue::Text(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl Hash for WhereValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            WhereValue::Bool(b) => b.hash(state),
            WhereValue::Number(n) => Self::canonical_number(*n).to_bits().hash(state),
            WhereValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for WhereValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereValue::Bool(b) => write!(f, "{}", b),
            WhereValue::Number(n) => write!(f, "{}", n),
            WhereValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for WhereValue {
    fn from(v: bool) -> Self {
        WhereValue::Bool(v)
    }
}

impl From<f64> for WhereValue {
    fn from(v: f64) -> Self {
        WhereValue::Number(v)
    }
}

/// Numbers are stored as `f64`: integers beyond ±2^53 are rounded to the
/// nearest representable value, so neighbouring large integers (ids, nanosecond
/// timestamps) can index under the same key. Keep such values as text.
impl From<i64> for WhereValue {
    fn from(v: i64) -> Self {
        WhereValue::Number(v as f64)
    }
}

impl From<i32> for WhereValue {
    fn from(v: i32) -> Self {
        WhereValue::Number(v as f64)
    }
}

impl From<u32> for WhereValue {
    fn from(v: u32) -> Self {
        WhereValue::Number(v as f64)
    }
}

impl From<&str> for WhereValue {
    fn from(v: &str) -> Self {
        WhereValue::Text(v.to_string())
    }
}

impl From<String> for WhereValue {
    fn from(v: String) -> Self {
        WhereValue::Text(v)
    }
}
