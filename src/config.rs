//! Explicit dashboard configuration, built once from the command line.

use crate::{Arguments, FilterFlowError, FilterFlowResult, FilterPanel, FilterSpec, customer_filters};

use std::path::PathBuf;

/// One `--filter NAME[=VALUE]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    /// Raw value, parsed later according to the filter kind.
    pub raw_value: Option<String>,
}

impl Selection {
    pub fn parse(selection: &str) -> FilterFlowResult<Self> {
        let (name, raw_value) = match selection.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
            None => (selection.trim(), None),
        };

        if name.is_empty() {
            return Err(FilterFlowError::InvalidArgument {
                arg_name: "--filter".to_string(),
                reason: format!("'{selection}' has no filter name"),
            });
        }

        Ok(Selection {
            name: name.to_string(),
            raw_value,
        })
    }
}

/// Everything a dashboard run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub path: PathBuf,
    pub table_name: String,
    pub csv_delimiter: String,
    /// Filters offered in the panel.
    pub catalog: Vec<FilterSpec>,
    /// Filters to enable, in enablement order.
    pub selections: Vec<Selection>,
    pub sample_rows: usize,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub sankey: Option<PathBuf>,
    pub list_filters: bool,
}

impl DashboardConfig {
    /// Builds the configuration, validating definitions and selections.
    pub fn new(args: &Arguments) -> FilterFlowResult<Self> {
        let catalog = if args.definitions.is_empty() {
            customer_filters()
        } else {
            args.definitions
                .iter()
                .map(|definition| {
                    FilterSpec::parse_definition(definition).map_err(|e| {
                        FilterFlowError::InvalidArgument {
                            arg_name: "--define".to_string(),
                            reason: e.to_string(),
                        }
                    })
                })
                .collect::<FilterFlowResult<Vec<FilterSpec>>>()?
        };

        let selections = args
            .filters
            .iter()
            .map(|selection| Selection::parse(selection))
            .collect::<FilterFlowResult<Vec<Selection>>>()?;

        if let Some(unknown) = selections
            .iter()
            .find(|s| !catalog.iter().any(|spec| spec.human_name == s.name))
        {
            let known: Vec<&str> = catalog.iter().map(|s| s.human_name.as_str()).collect();
            return Err(FilterFlowError::InvalidArgument {
                arg_name: "--filter".to_string(),
                reason: format!(
                    "unknown filter '{}' (available: {})",
                    unknown.name,
                    known.join(", ")
                ),
            });
        }

        let config = DashboardConfig {
            path: args.path.clone(),
            table_name: args.table_name.clone(),
            csv_delimiter: args.delimiter.clone(),
            catalog,
            selections,
            sample_rows: args.sample,
            seed: args.seed,
            output: args.output.clone(),
            sankey: args.sankey.clone(),
            list_filters: args.list,
        };

        tracing::debug!("DashboardConfig: {config:#?}");
        Ok(config)
    }

    /// Enables the selected filters in order, sets their values and submits the form.
    pub fn apply_selections(&self, panel: &mut FilterPanel) -> FilterFlowResult<()> {
        let names: Vec<&str> = self.selections.iter().map(|s| s.name.as_str()).collect();
        panel.select(&names)?;

        for selection in &self.selections {
            if let Some(raw) = &selection.raw_value {
                panel.set_raw_value(&selection.name, raw)?;
            }
        }

        panel.commit()
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
