//! The filter panel: the explicit UI state handed to every pipeline run.
//!
//! It owns the filters built from a catalog of `FilterSpec`s, remembers the order in
//! which the user enabled them, and carries the "commit" signal raised when the user
//! submits the widget values.

use crate::{Dataset, Filter, FilterFlowError, FilterFlowResult, FilterKind, FilterValue};

use std::collections::HashSet;

// --- FilterSpec ---

/// Declarative description of a filter, before the base dataset is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// The name to display in the UI.
    pub human_name: String,
    /// Corresponding column in the table.
    pub table_column: String,
    /// Key of the input widget.
    pub widget_id: String,
    pub kind: FilterKind,
}

impl FilterSpec {
    pub fn new(human_name: &str, table_column: &str, widget_id: &str, kind: FilterKind) -> Self {
        FilterSpec {
            human_name: human_name.to_string(),
            table_column: table_column.to_string(),
            widget_id: widget_id.to_string(),
            kind,
        }
    }

    /// Parses a `NAME:COLUMN:KIND` definition. The widget id is derived from the name
    /// (`"Weekly workouts"` -> `"weekly_workouts"`).
    pub fn parse_definition(definition: &str) -> FilterFlowResult<Self> {
        let parts: Vec<&str> = definition.split(':').map(str::trim).collect();

        let [human_name, table_column, kind] = parts.as_slice() else {
            return Err(FilterFlowError::InvalidConfiguration(format!(
                "filter definition '{definition}' must look like NAME:COLUMN:KIND"
            )));
        };

        if human_name.is_empty() || table_column.is_empty() {
            return Err(FilterFlowError::InvalidConfiguration(format!(
                "filter definition '{definition}' has an empty name or column"
            )));
        }

        let kind: FilterKind = kind.parse()?;
        let widget_id = human_name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");

        Ok(FilterSpec::new(human_name, table_column, &widget_id, kind))
    }

    /// Builds the filter, computing the range maximum from `base` when needed.
    pub fn build(&self, base: &Dataset) -> FilterFlowResult<Filter> {
        match self.kind {
            FilterKind::Equality => Ok(Filter::equality(
                &self.human_name,
                &self.table_column,
                &self.widget_id,
            )),
            FilterKind::Range => Filter::range_over(
                &self.human_name,
                &self.table_column,
                &self.widget_id,
                base,
            ),
        }
    }
}

/// The built-in catalog for the `CUSTOMERS` table.
pub fn customer_filters() -> Vec<FilterSpec> {
    vec![
        FilterSpec::new(
            "Current customer",
            "is_current_customer",
            "current_customer",
            FilterKind::Equality,
        ),
        FilterSpec::new("Tenure", "years_tenure", "tenure_slider", FilterKind::Range),
        FilterSpec::new(
            "Weekly workout count",
            "average_weekly_workout_count",
            "workouts_slider",
            FilterKind::Range,
        ),
    ]
}

// --- FilterPanel ---

/// Filters, their enablement order and the commit flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPanel {
    filters: Vec<Filter>,
    /// Indices into `filters`, in the order the user enabled them.
    enablement_order: Vec<usize>,
    committed: bool,
}

impl FilterPanel {
    /// Wraps already-built filters. Names must be unique.
    ///
    /// Filters that arrive enabled are ordered by their position in `filters`.
    pub fn new(filters: Vec<Filter>) -> FilterFlowResult<Self> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = filters.iter().find(|f| !seen.insert(f.human_name())) {
            return Err(FilterFlowError::InvalidConfiguration(format!(
                "duplicate filter name '{}'",
                duplicate.human_name()
            )));
        }

        let enablement_order = filters
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_enabled())
            .map(|(index, _)| index)
            .collect();

        Ok(FilterPanel {
            filters,
            enablement_order,
            committed: false,
        })
    }

    /// Builds every filter of `specs` against `base`.
    pub fn from_specs(specs: &[FilterSpec], base: &Dataset) -> FilterFlowResult<Self> {
        let filters = specs
            .iter()
            .map(|spec| spec.build(base))
            .collect::<FilterFlowResult<Vec<Filter>>>()?;

        FilterPanel::new(filters)
    }

    /// All filters, in catalog order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.human_name() == name)
    }

    fn position(&self, name: &str) -> FilterFlowResult<usize> {
        self.filters
            .iter()
            .position(|f| f.human_name() == name)
            .ok_or_else(|| FilterFlowError::UnknownFilter(name.to_string()))
    }

    /// Enables `name`. Re-enabling keeps the original position in the order.
    pub fn enable(&mut self, name: &str) -> FilterFlowResult<()> {
        let index = self.position(name)?;
        self.filters[index].enable();
        if !self.enablement_order.contains(&index) {
            self.enablement_order.push(index);
        }
        self.committed = false;
        Ok(())
    }

    pub fn disable(&mut self, name: &str) -> FilterFlowResult<()> {
        let index = self.position(name)?;
        self.filters[index].disable();
        self.enablement_order.retain(|&i| i != index);
        self.committed = false;
        Ok(())
    }

    /// Multiselect semantics: exactly `names` end up enabled, in the given order.
    pub fn select(&mut self, names: &[&str]) -> FilterFlowResult<()> {
        let indices = names
            .iter()
            .map(|name| self.position(name))
            .collect::<FilterFlowResult<Vec<usize>>>()?;

        for filter in &mut self.filters {
            filter.disable();
        }
        self.enablement_order.clear();

        for index in indices {
            self.filters[index].enable();
            if !self.enablement_order.contains(&index) {
                self.enablement_order.push(index);
            }
        }
        self.committed = false;
        Ok(())
    }

    pub fn set_value(&mut self, name: &str, value: FilterValue) -> FilterFlowResult<()> {
        let index = self.position(name)?;
        self.filters[index].set_value(value)?;
        self.committed = false;
        Ok(())
    }

    /// Parses `raw` according to the filter kind, then sets it.
    pub fn set_raw_value(&mut self, name: &str, raw: &str) -> FilterFlowResult<()> {
        let index = self.position(name)?;
        let value = self.filters[index].parse_value(raw)?;
        self.set_value(name, value)
    }

    pub fn is_any_enabled(&self) -> bool {
        !self.enablement_order.is_empty()
    }

    /// Enabled filters, in enablement order.
    pub fn active_filters(&self) -> Vec<&Filter> {
        self.enablement_order
            .iter()
            .map(|&index| &self.filters[index])
            .collect()
    }

    /// Human names of the enabled filters, in enablement order.
    pub fn active_names(&self) -> Vec<&str> {
        self.active_filters()
            .into_iter()
            .map(Filter::human_name)
            .collect()
    }

    /// Submits the form: every enabled filter still lacking a value receives its
    /// widget default, and the commit flag is raised.
    pub fn commit(&mut self) -> FilterFlowResult<()> {
        for &index in &self.enablement_order {
            let filter = &mut self.filters[index];
            if filter.value().is_none() {
                let default = filter.default_value();
                tracing::debug!(
                    "Filter '{}' submitted with default value {}",
                    filter.human_name(),
                    default
                );
                filter.set_value(default)?;
            }
        }
        self.committed = true;
        Ok(())
    }

    /// Whether the widget values were submitted since the last change.
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_panel
#[cfg(test)]
mod tests_panel {
    use super::*;
    use crate::Scalar;
    use polars::prelude::*;

    fn customers() -> PolarsResult<Dataset> {
        let df = df!(
            "IS_CURRENT_CUSTOMER" => &[true, false, true],
            "YEARS_TENURE" => &[3i64, 11, 6],
            "AVERAGE_WEEKLY_WORKOUT_COUNT" => &[1.5, 4.2, 0.0],
        )?;
        Ok(Dataset::from_frame("CUSTOMERS", df))
    }

    #[test]
    fn catalog_builds_with_precomputed_maximums() -> FilterFlowResult<()> {
        let panel = FilterPanel::from_specs(&customer_filters(), &customers()?)?;

        let names: Vec<&str> = panel.filters().iter().map(Filter::human_name).collect();
        assert_eq!(names, ["Current customer", "Tenure", "Weekly workout count"]);

        assert_eq!(panel.get("Current customer").and_then(Filter::max_value), None);
        assert_eq!(panel.get("Tenure").and_then(Filter::max_value), Some(11));
        assert_eq!(
            panel.get("Weekly workout count").and_then(Filter::max_value),
            Some(5)
        );
        assert!(!panel.is_any_enabled());
        Ok(())
    }

    #[test]
    fn active_filters_follow_enablement_order() -> FilterFlowResult<()> {
        let mut panel = FilterPanel::from_specs(&customer_filters(), &customers()?)?;

        panel.enable("Weekly workout count")?;
        panel.enable("Current customer")?;
        panel.enable("Weekly workout count")?; // no-op
        assert_eq!(panel.active_names(), ["Weekly workout count", "Current customer"]);

        panel.disable("Weekly workout count")?;
        panel.enable("Tenure")?;
        assert_eq!(panel.active_names(), ["Current customer", "Tenure"]);
        Ok(())
    }

    #[test]
    fn select_replaces_the_enabled_set() -> FilterFlowResult<()> {
        let mut panel = FilterPanel::from_specs(&customer_filters(), &customers()?)?;
        panel.enable("Current customer")?;

        panel.select(&["Tenure", "Weekly workout count"])?;
        assert_eq!(panel.active_names(), ["Tenure", "Weekly workout count"]);
        assert!(!panel.get("Current customer").is_some_and(Filter::is_enabled));
        Ok(())
    }

    #[test]
    fn unknown_names_are_rejected() -> FilterFlowResult<()> {
        let mut panel = FilterPanel::from_specs(&customer_filters(), &customers()?)?;
        assert!(matches!(
            panel.enable("Churn"),
            Err(FilterFlowError::UnknownFilter(name)) if name == "Churn"
        ));
        assert!(panel.select(&["Tenure", "Churn"]).is_err());
        // A failed select leaves the panel untouched.
        assert!(!panel.is_any_enabled());
        Ok(())
    }

    #[test]
    fn commit_fills_widget_defaults() -> FilterFlowResult<()> {
        let mut panel = FilterPanel::from_specs(&customer_filters(), &customers()?)?;
        panel.enable("Tenure")?;
        panel.enable("Current customer")?;
        panel.set_raw_value("Current customer", "true")?;
        assert!(!panel.is_committed());

        panel.commit()?;
        assert!(panel.is_committed());
        assert_eq!(
            panel.get("Tenure").and_then(Filter::value),
            Some(FilterValue::Between { lower: 0, upper: 11 })
        );
        assert_eq!(
            panel.get("Current customer").and_then(Filter::value),
            Some(FilterValue::Equals(Scalar::Boolean(true)))
        );
        // Disabled filters stay without a value.
        assert_eq!(panel.get("Weekly workout count").and_then(Filter::value), None);

        panel.set_raw_value("Tenure", "2..5")?;
        assert!(!panel.is_committed());
        Ok(())
    }

    #[test]
    fn duplicate_names_are_invalid() {
        let filters = vec![
            Filter::equality("Tenure", "years_tenure", "a"),
            Filter::range("Tenure", "years_tenure", "b", 3),
        ];
        assert!(matches!(
            FilterPanel::new(filters),
            Err(FilterFlowError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn definition_parsing() -> FilterFlowResult<()> {
        let spec = FilterSpec::parse_definition("Weekly workouts : average_weekly_workout_count : slider")?;
        assert_eq!(spec.human_name, "Weekly workouts");
        assert_eq!(spec.table_column, "average_weekly_workout_count");
        assert_eq!(spec.widget_id, "weekly_workouts");
        assert_eq!(spec.kind, FilterKind::Range);

        assert!(matches!(
            FilterSpec::parse_definition("Tenure:years_tenure:multiselect"),
            Err(FilterFlowError::InvalidConfiguration(_))
        ));
        assert!(FilterSpec::parse_definition("Tenure:years_tenure").is_err());
        assert!(FilterSpec::parse_definition(":years_tenure:range").is_err());
        Ok(())
    }
}
