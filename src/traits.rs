//! General utility traits shared by the loaders and the filters.
//!
//! This module centralizes extensions to existing types (`std::path::Path`, `Vec`, `polars::Schema`).

use crate::{FilterFlowError, FilterFlowResult};

use polars::prelude::{PlSmallStr, Schema};
use std::{collections::HashSet, ffi::OsStr, hash::Hash, path::Path};

/// Trait to extend `Path` with a convenient method for getting the lowercase file extension.
/// Used by `extension.rs`.
pub trait PathExtension {
    /// Returns the file extension as a lowercase `String`, or `None`.
    fn extension_as_lowercase(&self) -> Option<String>;
}

impl PathExtension for Path {
    fn extension_as_lowercase(&self) -> Option<String> {
        self.extension() // Get OsStr extension.
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
    }
}

/// A trait for deduplicating vectors while preserving the original order of elements.
/// Used by `source.rs` for delimiter guessing.
pub trait UniqueElements<T> {
    /// Removes duplicate elements in place, keeping the first occurrence.
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone;
}

impl<T> UniqueElements<T> for Vec<T> {
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone,
    {
        let mut seen = HashSet::new();
        // Keep if insert succeeds (element is new).
        self.retain(|x| seen.insert(x.clone()));
    }
}

/// Column lookup that tolerates case differences between a filter's configured
/// column and the physical schema.
///
/// Warehouse tables store unquoted identifiers in upper case (`YEARS_TENURE`) while
/// filters are usually declared in lower case (`years_tenure`).
pub trait SchemaLookup {
    /// Resolves `column` to the name actually present in the schema.
    ///
    /// An exact match wins; otherwise the first ASCII case-insensitive match is returned.
    fn resolve_column(&self, column: &str) -> FilterFlowResult<PlSmallStr>;
}

impl SchemaLookup for Schema {
    fn resolve_column(&self, column: &str) -> FilterFlowResult<PlSmallStr> {
        if self.get(column).is_some() {
            return Ok(column.into());
        }

        self.iter_names()
            .find(|name| name.as_str().eq_ignore_ascii_case(column))
            .cloned()
            .ok_or_else(|| FilterFlowError::ColumnNotFound {
                column: column.to_string(),
                available: self.iter_names().map(|name| name.to_string()).collect(),
            })
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//


#[cfg(test)]
mod tests_unique {
    use super::*;

    #[test]
    fn test_unique_keeps_first_occurrence() {
        let mut delimiters = vec![b';', b',', b';', b'|', b',', b'\t'];
        delimiters.unique();
        assert_eq!(delimiters, vec![b';', b',', b'|', b'\t']);
    }

    #[test]
    fn test_unique_empty() {
        let mut vec: Vec<i32> = vec![];
        vec.unique();
        assert!(vec.is_empty());
    }
}

/// Run tests with:
/// cargo test -- --show-output tests_schema_lookup
#[cfg(test)]
mod tests_schema_lookup {
    use super::*;
    use polars::prelude::{DataType, Field};

    fn customers_schema() -> Schema {
        Schema::from_iter([
            Field::new("IS_CURRENT_CUSTOMER".into(), DataType::Boolean),
            Field::new("YEARS_TENURE".into(), DataType::Int64),
            Field::new("name".into(), DataType::String),
        ])
    }

    #[test]
    fn exact_match_is_returned_as_is() -> FilterFlowResult<()> {
        let schema = customers_schema();
        assert_eq!(schema.resolve_column("name")?.as_str(), "name");
        Ok(())
    }

    #[test]
    fn lower_case_resolves_to_upper_case_column() -> FilterFlowResult<()> {
        let schema = customers_schema();
        assert_eq!(
            schema.resolve_column("years_tenure")?.as_str(),
            "YEARS_TENURE"
        );
        Ok(())
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let schema = customers_schema();
        match schema.resolve_column("weekly_workouts") {
            Err(FilterFlowError::ColumnNotFound { column, available }) => {
                assert_eq!(column, "weekly_workouts");
                assert_eq!(available.len(), 3);
            }
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }
}
