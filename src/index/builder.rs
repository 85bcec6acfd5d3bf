//! Index entry builder
//!
//! Derives term and range entries from a normalized field record:
//! - scalar field → one `eq` term entry + one range entry
//! - array field → one `contains` term entry per element, no range entry

use crate::error::Result;
use crate::index::codec::{build_range_key, build_term_key, check_field_name};
use crate::types::{DocFields, FieldValue, RangeIndexEntry, TermIndexEntry, TermMode};

/// Term entries for one document
pub fn build_term_entries(doc_id: &str, fields: &DocFields) -> Result<Vec<TermIndexEntry>> {
    let mut entries = Vec::new();

    for (field, value) in fields {
        match value {
            FieldValue::One(v) => entries.push(TermIndexEntry {
                term_key: build_term_key(field, v, TermMode::Eq)?,
                doc_id: doc_id.to_string(),
            }),
            FieldValue::Many(values) => {
                for v in values {
                    entries.push(TermIndexEntry {
                        term_key: build_term_key(field, v, TermMode::Contains)?,
                        doc_id: doc_id.to_string(),
                    });
                }
            }
        }
    }

    Ok(entries)
}

/// Range entries for one document (scalar fields only)
pub fn build_range_entries(doc_id: &str, fields: &DocFields) -> Result<Vec<RangeIndexEntry>> {
    let mut entries = Vec::new();

    for (field, value) in fields {
        if let FieldValue::One(v) = value {
            check_field_name(field)?;
            entries.push(RangeIndexEntry {
                field: field.clone(),
                range_key: build_range_key(v, doc_id)?,
                doc_id: doc_id.to_string(),
            });
        }
    }

    Ok(entries)
}

/// Both entry sets of one document state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntries {
    pub terms: Vec<TermIndexEntry>,
    pub ranges: Vec<RangeIndexEntry>,
}

impl IndexEntries {
    pub fn build(doc_id: &str, fields: &DocFields) -> Result<Self> {
        Ok(Self {
            terms: build_term_entries(doc_id, fields)?,
            ranges: build_range_entries(doc_id, fields)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::normalize::normalize;

    #[test]
    fn test_scalar_and_array_entries() -> Result<()> {
        let fields = DocFields::new()
            .with("category", "shoes")
            .with("tags", vec!["red", "blue"])
            .with("price", 42);

        let entries = IndexEntries::build("doc-1", &fields)?;

        // category(eq) + price(eq) + 2 × tags(contains)
        assert_eq!(entries.terms.len(), 4);
        assert!(entries.terms.contains(&TermIndexEntry {
            term_key: build_term_key("tags", &"red".into(), TermMode::Contains)?,
            doc_id: "doc-1".to_string(),
        }));
        assert!(entries.terms.contains(&TermIndexEntry {
            term_key: build_term_key("category", &"shoes".into(), TermMode::Eq)?,
            doc_id: "doc-1".to_string(),
        }));

        // Arrays have no range entries
        let range_fields: Vec<&str> = entries.ranges.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(range_fields, vec!["category", "price"]);
        Ok(())
    }

    #[test]
    fn test_dedup_before_build() -> Result<()> {
        let fields = normalize(&DocFields::new().with("tags", vec!["a", "a", "b"]));
        let terms = build_term_entries("doc-2", &fields)?;
        assert_eq!(terms.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_record() -> Result<()> {
        let entries = IndexEntries::build("doc-3", &DocFields::new())?;
        assert_eq!(entries, IndexEntries::default());
        Ok(())
    }

    #[test]
    fn test_range_key_embeds_doc_id() -> Result<()> {
        let ranges = build_range_entries("doc-4", &DocFields::new().with("price", 7))?;
        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].range_key.ends_with("\u{0}doc-4"));
        Ok(())
    }
}
