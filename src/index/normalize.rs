//! Field normalizer
//!
//! Array fields become sets (first occurrence kept); scalars pass through.
//! Both the stored and the incoming record go through the same function so
//! the diff compares like with like.

use crate::types::{DocFields, FieldValue, WhereValue};
use ahash::AHashSet;

pub fn normalize(fields: &DocFields) -> DocFields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::One(v) => FieldValue::One(v.clone()),
        FieldValue::Many(values) => {
            let mut seen: AHashSet<&WhereValue> = AHashSet::with_capacity(values.len());
            let distinct = values
                .iter()
                .filter(|v| seen.insert(*v))
                .cloned()
                .collect();
            FieldValue::Many(distinct)
        }
    }
}
