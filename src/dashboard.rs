//! One refresh of the dashboard: chain, flow diagram, audit trail and preview.
//!
//! Nothing is cached between refreshes. Every call reloads the base table through the
//! injected source and rebuilds the whole pipeline from the current panel state.

use crate::{
    AuditTrail, DatasetSequence, FilterChain, FilterFlowError, FilterFlowResult, FilterPanel,
    FilterSpec, FlowDiagram, TableSource, export_csv,
};

use polars::prelude::DataFrame;
use std::path::Path;

/// Default number of preview rows.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Everything the dashboard shows for the current panel state.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Human names of the applied filters, in order.
    pub filter_names: Vec<String>,
    pub sequence: DatasetSequence,
    pub diagram: FlowDiagram,
    pub audit: AuditTrail,
    /// Random sample of the final dataset.
    pub preview: DataFrame,
}

/// Pipeline runner bound to a data source and a base table.
pub struct Dashboard<'a> {
    chain: FilterChain<'a>,
    sample_rows: usize,
    seed: Option<u64>,
}

impl<'a> Dashboard<'a> {
    pub fn new(source: &'a dyn TableSource, table_name: &str) -> Self {
        Dashboard {
            chain: FilterChain::new(source, table_name),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            seed: None,
        }
    }

    /// Sets the preview size and sampling seed.
    pub fn with_preview(mut self, sample_rows: usize, seed: Option<u64>) -> Self {
        self.sample_rows = sample_rows;
        self.seed = seed;
        self
    }

    /// Builds the filters of `specs` against the base table (range maximums are
    /// queried here, once).
    pub fn build_panel(&self, specs: &[FilterSpec]) -> FilterFlowResult<FilterPanel> {
        let base = self.chain.load_base()?;
        FilterPanel::from_specs(specs, &base)
    }

    /// Runs the pipeline for the enabled filters of `panel`.
    ///
    /// ### Returns
    /// `Ok(None)` when no filter is enabled; there is nothing to visualize then.
    pub fn refresh(&self, panel: &FilterPanel) -> FilterFlowResult<Option<DashboardView>> {
        if !panel.is_any_enabled() {
            tracing::debug!("No filter enabled; nothing to refresh");
            return Ok(None);
        }

        let filters = panel.active_filters();
        let filter_names: Vec<String> = panel
            .active_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let sequence = self.chain.build_enabled(&filters)?;
        let diagram = FlowDiagram::new(&filter_names, &sequence)?;
        let audit = AuditTrail::build(&filter_names, &sequence)?;
        let preview = sequence.result().sample(self.sample_rows, self.seed)?;

        tracing::debug!(
            "Dashboard refreshed: {} filter(s), flow {:?}",
            filter_names.len(),
            diagram.links.value
        );

        Ok(Some(DashboardView {
            filter_names,
            sequence,
            diagram,
            audit,
            preview,
        }))
    }

    /// Rebuilds the chain from the submitted values of `panel` and writes its final
    /// dataset to `path` as CSV.
    ///
    /// An uncommitted panel is rejected.
    ///
    /// ### Returns
    /// The number of rows written.
    pub fn export(&self, panel: &FilterPanel, path: &Path) -> FilterFlowResult<usize> {
        if !panel.is_committed() {
            return Err(FilterFlowError::InvalidConfiguration(
                "filter values must be submitted before exporting".to_string(),
            ));
        }

        let sequence = self.chain.build_enabled(&panel.active_filters())?;
        export_csv(sequence.result(), path, b',')
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_dashboard
#[cfg(test)]
mod tests_dashboard {
    use super::*;
    use crate::{DEFAULT_EXPORT_FILE_NAME, MemorySource, customer_filters};
    use polars::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn source() -> FilterFlowResult<MemorySource> {
        let df = df!(
            "IS_CURRENT_CUSTOMER" => &[true, true, false, true, false, true, true, false],
            "YEARS_TENURE" => &[1i64, 3, 4, 5, 9, 2, 10, 3],
            "AVERAGE_WEEKLY_WORKOUT_COUNT" => &[0.0, 2.5, 1.0, 4.0, 3.0, 6.5, 1.5, 2.0],
        )?;
        Ok(MemorySource::new().with_table("CUSTOMERS", df))
    }

    #[test]
    fn idle_when_nothing_is_enabled() -> FilterFlowResult<()> {
        let source = source()?;
        let dashboard = Dashboard::new(&source, "CUSTOMERS");
        let panel = dashboard.build_panel(&customer_filters())?;

        assert!(dashboard.refresh(&panel)?.is_none());
        Ok(())
    }

    #[test]
    fn refresh_builds_every_output() -> FilterFlowResult<()> {
        let source = source()?;
        let dashboard = Dashboard::new(&source, "CUSTOMERS").with_preview(2, Some(42));
        let mut panel = dashboard.build_panel(&customer_filters())?;

        panel.enable("Current customer")?;
        panel.set_raw_value("Current customer", "true")?;
        panel.enable("Tenure")?;
        panel.set_raw_value("Tenure", "2..5")?;
        panel.commit()?;

        let view = dashboard
            .refresh(&panel)?
            .ok_or_else(|| FilterFlowError::Other("expected a view".to_string()))?;

        assert_eq!(view.filter_names, ["Current customer", "Tenure"]);
        assert_eq!(view.sequence.row_counts()?, vec![8, 5, 3]);
        assert_eq!(
            view.diagram.labels,
            ["Original data", "Filter: 'Current customer'", "Filter: 'Tenure'", "Result"]
        );
        assert_eq!(view.diagram.links.value, vec![8, 5]);
        assert_eq!(view.audit.len(), 2);
        assert_eq!(view.audit.rows[1].filter_label, "Tenure");
        assert_eq!(view.preview.height(), 2);
        Ok(())
    }

    #[test]
    fn export_requires_commit() -> FilterFlowResult<()> {
        let source = source()?;
        let dashboard = Dashboard::new(&source, "CUSTOMERS");
        let mut panel = dashboard.build_panel(&customer_filters())?;
        panel.enable("Weekly workout count")?;
        panel.set_raw_value("Weekly workout count", "2..4")?;

        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_EXPORT_FILE_NAME);
        assert!(matches!(
            dashboard.export(&panel, &path),
            Err(FilterFlowError::InvalidConfiguration(_))
        ));

        panel.commit()?;
        // Workout counts 2.5, 4.0, 3.0 and 2.0 fall inside [2, 4].
        assert_eq!(dashboard.export(&panel, &path)?, 4);
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 5);
        Ok(())
    }

    #[test]
    fn export_uses_the_latest_submitted_values() -> FilterFlowResult<()> {
        let source = source()?;
        let dashboard = Dashboard::new(&source, "CUSTOMERS");
        let mut panel = dashboard.build_panel(&customer_filters())?;
        panel.enable("Tenure")?;
        panel.set_raw_value("Tenure", "2..5")?;
        panel.commit()?;

        let view = dashboard
            .refresh(&panel)?
            .ok_or_else(|| FilterFlowError::Other("expected a view".to_string()))?;
        assert_eq!(view.sequence.result().row_count()?, 5);

        panel.set_raw_value("Tenure", "9..10")?;
        panel.commit()?;

        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_EXPORT_FILE_NAME);
        // Tenures 9 and 10 only.
        assert_eq!(dashboard.export(&panel, &path)?, 2);
        let written = fs::read_to_string(&path)?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("false,9,"));
        assert!(lines[2].starts_with("true,10,"));
        Ok(())
    }

    #[test]
    fn refresh_fails_on_missing_value() -> FilterFlowResult<()> {
        let source = source()?;
        let dashboard = Dashboard::new(&source, "CUSTOMERS");
        let mut panel = dashboard.build_panel(&customer_filters())?;
        panel.enable("Tenure")?;

        assert!(matches!(
            dashboard.refresh(&panel),
            Err(FilterFlowError::InvalidConfiguration(_))
        ));
        Ok(())
    }
}
