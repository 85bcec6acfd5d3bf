//! Document field records

use super::WhereValue;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Value held by one document field: a scalar or a multi-valued array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Array field (set semantics after normalization)
    Many(Vec<WhereValue>),

    /// Scalar field
    One(WhereValue),
}

impl FieldValue {
    pub fn is_array(&self) -> bool {
        matches!(self, FieldValue::Many(_))
    }
}

macro_rules! impl_field_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::One(v.into())
                }
            }

            impl From<Vec<$t>> for FieldValue {
                fn from(values: Vec<$t>) -> Self {
                    FieldValue::Many(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_field_value_from!(WhereValue, bool, f64, i64, i32, u32, &str, String);

/// Full snapshot of a document's indexed fields
///
/// Every write replaces the previous record wholesale; there is no patch form.
/// Fields are kept in name order so derived entry lists are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocFields {
    fields: BTreeMap<String, FieldValue>,
}

impl DocFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field, returning the value it replaced
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for DocFields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DocFields {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a DocFields {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_shape() {
        let json = r#"{"category":"shoes","tags":["red","blue"],"price":42}"#;
        let fields: DocFields = serde_json::from_str(json).unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("category"), Some(&FieldValue::from("shoes")));
        assert_eq!(fields.get("tags"), Some(&FieldValue::from(vec!["red", "blue"])));
        assert_eq!(fields.get("price"), Some(&FieldValue::from(42)));
    }

    #[test]
    fn test_builder_replaces() {
        let fields = DocFields::new().with("a", 1).with("a", "x");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("a"), Some(&FieldValue::from("x")));
    }
}
