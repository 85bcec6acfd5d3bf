//! Value codec - ordered string keys for term and range indexes
//!
//! Every encoded value starts with a one-character kind tag followed by a
//! body whose lexicographic order matches the value order:
//! - Bool: `b0` / `b1`
//! - Number: `n` + 16 hex digits of the order-preserving IEEE-754 bit pattern
//! - Text: `s` + the string itself
//!
//! Range keys append [`KEY_SEPARATOR`] and the document id, so all entries
//! sharing one value sit in `[range_lower_bound(v), range_upper_bound(v)]`.

use crate::error::{IndexError, Result};
use crate::types::{TermMode, ValueKind, WhereValue};

/// Separates the encoded value from the document id in a range key.
/// Sorts below every other character, so `v` + SEP sorts before any longer value.
pub const KEY_SEPARATOR: char = '\u{0}';

/// Sorts above every character a document id may contain
pub const MAX_SENTINEL: char = char::MAX;

/// Encode a value into its ordered string form
pub fn serialize(value: &WhereValue) -> Result<String> {
    let mut out = String::new();
    out.push(value.kind().tag());

    match value {
        WhereValue::Bool(b) => out.push(if *b { '1' } else { '0' }),
        WhereValue::Number(n) => {
            let bits = ordered_f64_bits(*n)?;
            out.push_str(&format!("{:016x}", bits));
        }
        WhereValue::Text(s) => {
            check_reserved_chars(s, "text value")?;
            out.push_str(s);
        }
    }

    Ok(out)
}

/// Partition key of a term entry
///
/// Layout: `<field len>:<field>#<mode>#<encoded value>`. The length prefix
/// keeps the field boundary unambiguous whatever characters the name holds,
/// and the encoded value comes last, so distinct triples never collide.
pub fn build_term_key(field: &str, value: &WhereValue, mode: TermMode) -> Result<String> {
    check_field_name(field)?;
    Ok(format!(
        "{}:{}#{}#{}",
        field.len(),
        field,
        mode.as_str(),
        serialize(value)?
    ))
}

/// Sort key of a range entry: encoded value, separator, document id
pub fn build_range_key(value: &WhereValue, doc_id: &str) -> Result<String> {
    let mut key = serialize(value)?;
    key.push(KEY_SEPARATOR);
    key.push_str(doc_id);
    Ok(key)
}

/// Inclusive lower bound covering every range key for `value`
pub fn range_lower_bound(value: &WhereValue) -> Result<String> {
    let mut key = serialize(value)?;
    key.push(KEY_SEPARATOR);
    Ok(key)
}

/// Inclusive upper bound covering every range key for `value`
pub fn range_upper_bound(value: &WhereValue) -> Result<String> {
    let mut key = serialize(value)?;
    key.push(KEY_SEPARATOR);
    key.push(MAX_SENTINEL);
    Ok(key)
}

/// Smallest key any value of `kind` can encode to
pub fn kind_lower_bound(kind: ValueKind) -> String {
    kind.tag().to_string()
}

/// Largest key any value of `kind` can encode to
pub fn kind_upper_bound(kind: ValueKind) -> String {
    let mut key = kind.tag().to_string();
    key.push(MAX_SENTINEL);
    key
}

/// Reject characters reserved for key construction
pub fn check_reserved_chars(s: &str, what: &str) -> Result<()> {
    if s.contains(KEY_SEPARATOR) || s.contains(MAX_SENTINEL) {
        return Err(IndexError::UnsupportedValue(format!(
            "{} {:?} contains a reserved character (U+0000 or U+10FFFF)",
            what, s
        )));
    }
    Ok(())
}

pub fn check_field_name(field: &str) -> Result<()> {
    if field.is_empty() {
        return Err(IndexError::InvalidArgument("field name must not be empty".to_string()));
    }
    Ok(())
}

/// Map an f64 onto a u64 whose unsigned order matches numeric order
fn ordered_f64_bits(n: f64) -> Result<u64> {
    if n.is_nan() {
        return Err(IndexError::UnsupportedValue("NaN cannot be indexed".to_string()));
    }

    // -0.0 and 0.0 must produce the same key
    let n = if n == 0.0 { 0.0 } else { n };
    let bits = n.to_bits();

    if bits & (1 << 63) != 0 {
        Ok(!bits)
    } else {
        Ok(bits | (1 << 63))
    }
}
