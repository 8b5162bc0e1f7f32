//! Incremental filter-chain construction.
//!
//! `build_sequence` folds the enabled filters over the base dataset, keeping every
//! intermediate result: `[base, f1(base), f2(f1(base)), ...]`. The sequence is what
//! both the flow diagram and the audit trail are derived from.

use crate::{Dataset, Filter, FilterFlowError, FilterFlowResult, TableSource};

use std::ops::Index;

/// Ordered list of progressively filtered datasets. Never empty: the first entry
/// is always the unfiltered base.
#[derive(Debug, Clone)]
pub struct DatasetSequence {
    datasets: Vec<Dataset>,
}

impl DatasetSequence {
    /// Number of datasets, i.e. `1 + number of applied filters`.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether the sequence holds no dataset (never the case once built).
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// The unfiltered base dataset.
    pub fn base(&self) -> &Dataset {
        &self.datasets[0]
    }

    /// The dataset after the last filter (the base when no filter is applied).
    pub fn result(&self) -> &Dataset {
        &self.datasets[self.datasets.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&Dataset> {
        self.datasets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dataset> {
        self.datasets.iter()
    }

    pub fn as_slice(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Row count of every dataset, in order.
    pub fn row_counts(&self) -> FilterFlowResult<Vec<usize>> {
        self.datasets.iter().map(Dataset::row_count).collect()
    }
}

impl Index<usize> for DatasetSequence {
    type Output = Dataset;

    fn index(&self, index: usize) -> &Self::Output {
        &self.datasets[index]
    }
}

impl<'a> IntoIterator for &'a DatasetSequence {
    type Item = &'a Dataset;
    type IntoIter = std::slice::Iter<'a, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

/// Applies `filters` cumulatively (AND semantics) to `base`, in the given order.
///
/// The fold never short-circuits on an empty intermediate result; a failing step
/// aborts the whole chain and its error is returned.
pub fn build_sequence(base: &Dataset, filters: &[&Filter]) -> FilterFlowResult<DatasetSequence> {
    let mut datasets = Vec::with_capacity(filters.len() + 1);
    datasets.push(base.clone());

    for (step, filter) in filters.iter().enumerate() {
        let previous = &datasets[step];
        let next = filter.apply(previous)?;
        tracing::debug!(
            "Chain step {}: applied filter '{}' ({})",
            step + 1,
            filter.human_name(),
            filter
                .value()
                .map(|value| value.to_string())
                .unwrap_or_default()
        );
        datasets.push(next);
    }

    Ok(DatasetSequence { datasets })
}

/// Chain builder bound to a data source.
///
/// The source is injected rather than shared: every run loads the base table
/// through it and builds a fresh sequence.
pub struct FilterChain<'a> {
    source: &'a dyn TableSource,
    table_name: String,
}

impl<'a> FilterChain<'a> {
    pub fn new(source: &'a dyn TableSource, table_name: &str) -> Self {
        FilterChain {
            source,
            table_name: table_name.to_string(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Loads the base table from the injected source.
    pub fn load_base(&self) -> FilterFlowResult<Dataset> {
        self.source.load_base_table(&self.table_name)
    }

    /// Loads the base table and folds `filters` over it.
    pub fn build(&self, filters: &[&Filter]) -> FilterFlowResult<DatasetSequence> {
        let base = self.load_base()?;
        build_sequence(&base, filters)
    }

    /// Like `build`, but refuses disabled filters.
    pub fn build_enabled(&self, filters: &[&Filter]) -> FilterFlowResult<DatasetSequence> {
        if let Some(disabled) = filters.iter().find(|f| !f.is_enabled()) {
            return Err(FilterFlowError::InvalidConfiguration(format!(
                "filter '{}' is not enabled",
                disabled.human_name()
            )));
        }
        self.build(filters)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
