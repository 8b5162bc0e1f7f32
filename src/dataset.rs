//! The `Dataset` handle: an immutable, lazily evaluated view over a table.
//!
//! Every filtering step produces a *new* `Dataset` wrapping an extended query plan;
//! the source plan is never touched. Row counts, previews and the query text are all
//! derived on demand from the plan.

use crate::{FilterFlowError, FilterFlowResult, SchemaLookup};

use polars::prelude::*;
use std::fmt;

/// Alias of the single column produced when counting rows.
const ROW_COUNT_COLUMN: &str = "row_count";

/// Alias of the single column produced when computing a column maximum.
const COLUMN_MAX_COLUMN: &str = "column_max";

/// Alias of the non-null count computed alongside the maximum.
const NON_NULL_COLUMN: &str = "non_null";

/// An opaque, queryable tabular collection of rows.
///
/// Backed by a Polars `LazyFrame`, so each `Dataset` is really a query plan. Cloning is
/// cheap (the plan is reference counted) and never duplicates row data.
#[derive(Clone)]
pub struct Dataset {
    /// Table name this dataset was derived from.
    name: String,
    /// The query plan producing the rows.
    plan: LazyFrame,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Dataset {
    /// Wraps an existing query plan.
    pub fn new(name: impl Into<String>, plan: LazyFrame) -> Self {
        Dataset {
            name: name.into(),
            plan,
        }
    }

    /// Wraps an eager, in-memory `DataFrame`.
    pub fn from_frame(name: impl Into<String>, df: DataFrame) -> Self {
        Dataset::new(name, df.lazy())
    }

    /// Name of the table this dataset was derived from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying query plan.
    pub fn plan(&self) -> &LazyFrame {
        &self.plan
    }

    /// Resolves the output schema of the plan without executing it.
    pub fn schema(&self) -> FilterFlowResult<SchemaRef> {
        Ok(self.plan.clone().collect_schema()?)
    }

    /// Maps a configured column name onto the physical column name (case-insensitive).
    pub fn resolve_column(&self, column: &str) -> FilterFlowResult<PlSmallStr> {
        self.schema()?.resolve_column(column)
    }

    /// Returns a new dataset restricted to the rows satisfying `predicate`.
    ///
    /// `self` is left untouched: the predicate extends a clone of the plan.
    pub fn filter(&self, predicate: Expr) -> Dataset {
        Dataset {
            name: self.name.clone(),
            plan: self.plan.clone().filter(predicate),
        }
    }

    /// Counts the rows produced by the plan.
    pub fn row_count(&self) -> FilterFlowResult<usize> {
        let counted = self
            .plan
            .clone()
            .select([len().alias(ROW_COUNT_COLUMN)])
            .collect()?;

        let value = counted.column(ROW_COUNT_COLUMN)?.get(0)?;

        // A zero-row frame still yields one count row; a null here is an engine bug.
        value.extract::<usize>().ok_or_else(|| {
            PolarsError::ComputeError(format!("unexpected row count value: {value}").into()).into()
        })
    }

    /// Maximum of a numeric column, rounded up to the next integer.
    ///
    /// Returns `Ok(None)` when the column only holds nulls (or the dataset is empty),
    /// and `InvalidConfiguration` when the maximum does not fit in an `i64`.
    pub fn column_max(&self, column: &str) -> FilterFlowResult<Option<i64>> {
        let name = self.resolve_column(column)?;

        let frame = self
            .plan
            .clone()
            .select([
                col(name.clone())
                    .max()
                    .cast(DataType::Float64)
                    .ceil()
                    .cast(DataType::Int64)
                    .alias(COLUMN_MAX_COLUMN),
                col(name.clone()).count().alias(NON_NULL_COLUMN),
            ])
            .collect()?;

        let value = frame.column(COLUMN_MAX_COLUMN)?.get(0)?;
        let non_null = frame
            .column(NON_NULL_COLUMN)?
            .get(0)?
            .extract::<usize>()
            .unwrap_or_default();

        match value.extract::<i64>() {
            Some(max_value) => Ok(Some(max_value)),
            None if non_null == 0 => Ok(None),
            // The non-strict cast nulls out values beyond the i64 range.
            None => Err(FilterFlowError::InvalidConfiguration(format!(
                "maximum of column '{name}' in '{}' does not fit in a 64-bit integer",
                self.name
            ))),
        }
    }

    /// Executes the plan and returns all rows.
    pub fn collect(&self) -> FilterFlowResult<DataFrame> {
        let df = self.plan.clone().with_new_streaming(true).collect()?;
        tracing::trace!("Dataset '{}' collected. Shape: {:?}", self.name, df.shape());
        Ok(df)
    }

    /// Random preview of at most `n` rows, sampled without replacement.
    ///
    /// `seed` makes the preview reproducible.
    pub fn sample(&self, n: usize, seed: Option<u64>) -> FilterFlowResult<DataFrame> {
        let df = self.collect()?;
        let n = n.min(df.height());

        if n == 0 {
            return Ok(df.head(Some(0)));
        }

        Ok(df.sample_n_literal(n, false, false, seed)?)
    }

    /// Textual representation of the query plan that produces this dataset.
    pub fn query_text(&self) -> FilterFlowResult<String> {
        Ok(self.plan.describe_plan()?)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
