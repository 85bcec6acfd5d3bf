//! Query reader
//!
//! Single-predicate lookups returning candidate document ids, one page at a
//! time. Pages are not snapshot-isolated: writes landing between two pages
//! of the same query can shift what later pages contain.

use crate::error::{IndexError, Result};
use crate::index::codec::{
    build_term_key, check_field_name, kind_lower_bound, kind_upper_bound, range_lower_bound,
    range_upper_bound,
};
use crate::storage::{IndexBackend, SortKeyRange};
use crate::types::{QueryOptions, QueryPage, TermMode, WhereValue};
use std::sync::Arc;
use tracing::trace;

pub struct IndexReader<B: IndexBackend + ?Sized> {
    backend: Arc<B>,
    default_limit: usize,
}

impl<B: IndexBackend + ?Sized> Clone for IndexReader<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            default_limit: self.default_limit,
        }
    }
}

impl<B: IndexBackend + ?Sized> IndexReader<B> {
    pub fn new(backend: Arc<B>, default_limit: usize) -> Self {
        Self {
            backend,
            default_limit,
        }
    }

    /// Equality / membership lookups
    pub fn terms(&self) -> TermQuery<'_, B> {
        TermQuery { reader: self }
    }

    /// Ordered lookups on scalar fields
    pub fn ranges(&self) -> RangeQuery<'_, B> {
        RangeQuery { reader: self }
    }

    fn limit(&self, opts: &QueryOptions) -> Result<usize> {
        match opts.limit {
            Some(0) => Err(IndexError::InvalidArgument("limit must be at least 1".to_string())),
            Some(limit) => Ok(limit),
            None => Ok(self.default_limit),
        }
    }
}

pub struct TermQuery<'a, B: IndexBackend + ?Sized> {
    reader: &'a IndexReader<B>,
}

impl<'a, B: IndexBackend + ?Sized> TermQuery<'a, B> {
    /// Documents whose `field` matches `value` under `mode`
    pub fn query(
        &self,
        field: &str,
        mode: TermMode,
        value: impl Into<WhereValue>,
        opts: &QueryOptions,
    ) -> Result<QueryPage> {
        let limit = self.reader.limit(opts)?;
        let term_key = build_term_key(field, &value.into(), mode)?;

        let page = self
            .reader
            .backend
            .scan_terms(&term_key, opts.cursor.as_deref(), limit)?;
        trace!(field, %mode, ids = page.candidate_ids.len(), more = !page.is_last(), "term page");
        Ok(page)
    }

    /// Scalar `field` equals `value`
    pub fn eq(&self, field: &str, value: impl Into<WhereValue>, opts: &QueryOptions) -> Result<QueryPage> {
        self.query(field, TermMode::Eq, value, opts)
    }

    /// Array `field` contains `value`
    pub fn contains(
        &self,
        field: &str,
        value: impl Into<WhereValue>,
        opts: &QueryOptions,
    ) -> Result<QueryPage> {
        self.query(field, TermMode::Contains, value, opts)
    }
}

pub struct RangeQuery<'a, B: IndexBackend + ?Sized> {
    reader: &'a IndexReader<B>,
}

impl<'a, B: IndexBackend + ?Sized> RangeQuery<'a, B> {
    /// `lower <= field <= upper`; both bounds must be of the same kind
    pub fn between(
        &self,
        field: &str,
        lower: impl Into<WhereValue>,
        upper: impl Into<WhereValue>,
        opts: &QueryOptions,
    ) -> Result<QueryPage> {
        let (lower, upper) = (lower.into(), upper.into());
        if lower.kind() != upper.kind() {
            return Err(IndexError::InvalidArgument(format!(
                "between bounds differ in kind: {} vs {}",
                lower.kind().name(),
                upper.kind().name()
            )));
        }
        if lower > upper {
            return Err(IndexError::InvalidArgument(format!(
                "between lower bound {} exceeds upper bound {}",
                lower, upper
            )));
        }

        let range = SortKeyRange::new(range_lower_bound(&lower)?, range_upper_bound(&upper)?);
        self.scan(field, range, opts)
    }

    /// `field >= lower`, among values of the same kind as `lower`
    pub fn gte(&self, field: &str, lower: impl Into<WhereValue>, opts: &QueryOptions) -> Result<QueryPage> {
        let lower = lower.into();
        let range = SortKeyRange::new(range_lower_bound(&lower)?, kind_upper_bound(lower.kind()));
        self.scan(field, range, opts)
    }

    /// `field <= upper`, among values of the same kind as `upper`
    pub fn lte(&self, field: &str, upper: impl Into<WhereValue>, opts: &QueryOptions) -> Result<QueryPage> {
        let upper = upper.into();
        let range = SortKeyRange::new(kind_lower_bound(upper.kind()), range_upper_bound(&upper)?);
        self.scan(field, range, opts)
    }

    fn scan(&self, field: &str, range: SortKeyRange, opts: &QueryOptions) -> Result<QueryPage> {
        check_field_name(field)?;
        let limit = self.reader.limit(opts)?;

        let page = self
            .reader
            .backend
            .scan_ranges(field, range, opts.cursor.as_deref(), limit)?;
        trace!(field, ids = page.candidate_ids.len(), more = !page.is_last(), "range page");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::writer::IndexWriter;
    use crate::storage::{KvBackend, MemoryKvStore};
    use crate::types::DocFields;

    type Backend = KvBackend<MemoryKvStore>;

    fn setup() -> (IndexWriter<Backend>, IndexReader<Backend>) {
        let backend = Arc::new(KvBackend::new(
            Arc::new(MemoryKvStore::new()),
            &IndexConfig::for_testing(),
        ));
        (IndexWriter::new(Arc::clone(&backend)), IndexReader::new(backend, 100))
    }

    fn all() -> QueryOptions {
        QueryOptions::new()
    }

    #[test]
    fn test_eq_and_contains() -> Result<()> {
        let (writer, reader) = setup();
        writer.write("d1", &DocFields::new().with("color", "red").with("tags", vec!["red"]))?;
        writer.write("d2", &DocFields::new().with("color", "blue"))?;

        assert_eq!(reader.terms().eq("color", "red", &all())?.candidate_ids, vec!["d1"]);
        assert_eq!(reader.terms().contains("tags", "red", &all())?.candidate_ids, vec!["d1"]);

        // An array element is not an eq match and a scalar is not a contains match
        assert!(reader.terms().eq("tags", "red", &all())?.candidate_ids.is_empty());
        assert!(reader.terms().contains("color", "red", &all())?.candidate_ids.is_empty());
        Ok(())
    }

    #[test]
    fn test_numeric_ranges() -> Result<()> {
        let (writer, reader) = setup();
        for (doc, price) in [("a", -5.0), ("b", 9.5), ("c", 10.0), ("d", 100.0)] {
            writer.write(doc, &DocFields::new().with("price", price))?;
        }

        assert_eq!(reader.ranges().between("price", 9.5, 10.0, &all())?.candidate_ids, vec!["b", "c"]);
        assert_eq!(reader.ranges().gte("price", 10, &all())?.candidate_ids, vec!["c", "d"]);
        assert_eq!(reader.ranges().lte("price", 0, &all())?.candidate_ids, vec!["a"]);
        Ok(())
    }

    #[test]
    fn test_one_sided_ranges_stay_in_kind() -> Result<()> {
        let (writer, reader) = setup();
        writer.write("num", &DocFields::new().with("v", 5))?;
        writer.write("text", &DocFields::new().with("v", "zebra"))?;
        writer.write("flag", &DocFields::new().with("v", true))?;

        assert_eq!(reader.ranges().gte("v", 0, &all())?.candidate_ids, vec!["num"]);
        assert_eq!(reader.ranges().lte("v", "zzz", &all())?.candidate_ids, vec!["text"]);
        assert_eq!(reader.ranges().gte("v", false, &all())?.candidate_ids, vec!["flag"]);
        Ok(())
    }

    #[test]
    fn test_text_range_prefix_boundaries() -> Result<()> {
        let (writer, reader) = setup();
        for (doc, name) in [("1", "a"), ("2", "ab"), ("3", "abc"), ("4", "b")] {
            writer.write(doc, &DocFields::new().with("name", name))?;
        }

        assert_eq!(reader.ranges().between("name", "ab", "ab", &all())?.candidate_ids, vec!["2"]);
        assert_eq!(reader.ranges().between("name", "a", "abc", &all())?.candidate_ids, vec!["1", "2", "3"]);
        Ok(())
    }

    #[test]
    fn test_invalid_range_arguments() {
        let (_, reader) = setup();
        assert!(matches!(
            reader.ranges().between("price", 1, "x", &all()),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            reader.ranges().between("price", 10, 1, &all()),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            reader.ranges().gte("", 1, &all()),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let (_, reader) = setup();
        let opts = QueryOptions::new().with_limit(0);
        assert!(matches!(reader.terms().eq("a", 1, &opts), Err(IndexError::InvalidArgument(_))));
    }

    #[test]
    fn test_max_limit_is_one_full_page() -> Result<()> {
        let (writer, reader) = setup();
        writer.write("d1", &DocFields::new().with("category", "shoes").with("price", 3))?;
        writer.write("d2", &DocFields::new().with("category", "shoes").with("price", 4))?;
        let opts = QueryOptions::new().with_limit(usize::MAX);

        let page = reader.terms().eq("category", "shoes", &opts)?;
        assert_eq!(page.candidate_ids, vec!["d1", "d2"]);
        assert!(page.is_last());

        let page = reader.ranges().gte("price", 0, &opts)?;
        assert_eq!(page.candidate_ids, vec!["d1", "d2"]);
        assert!(page.is_last());
        Ok(())
    }

    #[test]
    fn test_malformed_cursor() {
        let (_, reader) = setup();
        let opts = QueryOptions::new().with_cursor("definitely-not-hex");
        let err = reader.ranges().gte("price", 0, &opts).unwrap_err();
        assert!(err.is_invalid_cursor());
    }
}
