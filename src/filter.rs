//! A single named, parametrized predicate over one column of a dataset.
//!
//! A filter is either an **equality** test (checkbox-like: `column == value`) or an
//! inclusive **range** test (slider-like: `lower <= column <= upper`). The kind is fixed
//! when the filter is built; the enabled flag and the current value are the mutable
//! state driven by the user.

use crate::{Dataset, FilterFlowError, FilterFlowResult};

use polars::prelude::*;
use regex::Regex;
use std::{fmt, ops::RangeInclusive, str::FromStr, sync::LazyLock};

/// Accepts `2..5`, `2..=5`, `2,5` and `2 - 5` (whitespace tolerant, signed integers).
static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+)\s*(?:\.\.=?|,|\s-\s)\s*(-?\d+)\s*$")
        .expect("range pattern is a valid regex")
});

// --- Scalar ---

/// A value an equality filter compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl Scalar {
    /// Interprets user input: `true`/`false` (any case), then integers, then text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("true") {
            Scalar::Boolean(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Scalar::Boolean(false)
        } else if let Ok(integer) = trimmed.parse::<i64>() {
            Scalar::Integer(integer)
        } else {
            Scalar::Text(trimmed.to_string())
        }
    }

    fn to_lit(&self) -> Expr {
        match self {
            Scalar::Boolean(value) => lit(*value),
            Scalar::Integer(value) => lit(*value),
            Scalar::Text(value) => lit(value.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(value) => write!(f, "{value}"),
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Text(value) => write!(f, "'{value}'"),
        }
    }
}

// --- FilterKind ---

/// The two supported parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// `column == value`, rendered as a checkbox.
    Equality,
    /// `lower <= column <= upper`, rendered as a range slider.
    Range,
}

impl FromStr for FilterKind {
    type Err = FilterFlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equality" | "eq" | "checkbox" => Ok(FilterKind::Equality),
            "range" | "between" | "slider" | "select_slider" => Ok(FilterKind::Range),
            other => Err(FilterFlowError::InvalidConfiguration(format!(
                "unsupported filter kind '{other}' (expected 'equality' or 'range')"
            ))),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Equality => write!(f, "equality"),
            FilterKind::Range => write!(f, "range"),
        }
    }
}

// --- FilterValue ---

/// A value supplied for a filter by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Equals(Scalar),
    Between { lower: i64, upper: i64 },
}

impl FilterValue {
    /// The filter kind this value fits.
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Equals(_) => FilterKind::Equality,
            FilterValue::Between { .. } => FilterKind::Range,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Equals(scalar) => write!(f, "= {scalar}"),
            FilterValue::Between { lower, upper } => write!(f, "{lower}..={upper}"),
        }
    }
}

// --- FilterParam ---

/// Per-kind parameters of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    Equality {
        value: Option<Scalar>,
    },
    Range {
        /// Column maximum, computed once from the base dataset.
        max_value: i64,
        /// Inclusive `(lower, upper)` bounds.
        bounds: Option<(i64, i64)>,
    },
}

// --- Filter ---

/// A named predicate configuration on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The name to display in the UI and in the flow diagram.
    human_name: String,
    /// Corresponding column in the table (resolved case-insensitively).
    table_column: String,
    /// Key of the input widget bound to this filter.
    widget_id: String,
    /// Whether the user enabled this filter.
    enabled: bool,
    param: FilterParam,
}

impl Filter {
    /// Builds a disabled equality filter without a value.
    pub fn equality(human_name: &str, table_column: &str, widget_id: &str) -> Self {
        Filter {
            human_name: human_name.to_string(),
            table_column: table_column.to_string(),
            widget_id: widget_id.to_string(),
            enabled: false,
            param: FilterParam::Equality { value: None },
        }
    }

    /// Builds a disabled range filter with a known column maximum.
    pub fn range(human_name: &str, table_column: &str, widget_id: &str, max_value: i64) -> Self {
        Filter {
            human_name: human_name.to_string(),
            table_column: table_column.to_string(),
            widget_id: widget_id.to_string(),
            enabled: false,
            param: FilterParam::Range {
                max_value,
                bounds: None,
            },
        }
    }

    /// Builds a disabled range filter, querying the column maximum of `base` once.
    ///
    /// An all-null (or empty) column yields a maximum of 0.
    pub fn range_over(
        human_name: &str,
        table_column: &str,
        widget_id: &str,
        base: &Dataset,
    ) -> FilterFlowResult<Self> {
        let max_value = match base.column_max(table_column)? {
            Some(max_value) => max_value,
            None => {
                tracing::warn!(
                    "Column '{}' of '{}' has no maximum; range filter '{}' defaults to 0",
                    table_column,
                    base.name(),
                    human_name
                );
                0
            }
        };

        tracing::debug!("Range filter '{human_name}': max value {max_value}");
        Ok(Filter::range(human_name, table_column, widget_id, max_value))
    }

    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    pub fn table_column(&self) -> &str {
        &self.table_column
    }

    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    pub fn param(&self) -> &FilterParam {
        &self.param
    }

    pub fn kind(&self) -> FilterKind {
        match self.param {
            FilterParam::Equality { .. } => FilterKind::Equality,
            FilterParam::Range { .. } => FilterKind::Range,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Column maximum for range filters.
    pub fn max_value(&self) -> Option<i64> {
        match self.param {
            FilterParam::Range { max_value, .. } => Some(max_value),
            FilterParam::Equality { .. } => None,
        }
    }

    /// The options a range slider offers: `0..=max_value`.
    pub fn range_options(&self) -> Option<RangeInclusive<i64>> {
        self.max_value().map(|max_value| 0..=max_value)
    }

    /// Label of the input widget, e.g. `"Select the range of tenure_slider"`.
    pub fn widget_label(&self) -> String {
        match self.kind() {
            FilterKind::Range => format!("Select the range of {}", self.widget_id),
            FilterKind::Equality => format!("Is {}", self.widget_id),
        }
    }

    /// The value an untouched widget submits: the full range, or an unticked checkbox.
    pub fn default_value(&self) -> FilterValue {
        match self.param {
            FilterParam::Range { max_value, .. } => FilterValue::Between {
                lower: 0,
                upper: max_value,
            },
            FilterParam::Equality { .. } => FilterValue::Equals(Scalar::Boolean(false)),
        }
    }

    /// The current value, if one was supplied.
    pub fn value(&self) -> Option<FilterValue> {
        match &self.param {
            FilterParam::Equality { value } => value.clone().map(FilterValue::Equals),
            FilterParam::Range { bounds, .. } => bounds
                .map(|(lower, upper)| FilterValue::Between { lower, upper }),
        }
    }

    /// Sets the current value. The value must fit the filter kind and ranges
    /// must not be inverted.
    pub fn set_value(&mut self, new_value: FilterValue) -> FilterFlowResult<()> {
        let kind = self.kind();
        match (&mut self.param, new_value) {
            (FilterParam::Equality { value }, FilterValue::Equals(scalar)) => {
                *value = Some(scalar);
                Ok(())
            }
            (FilterParam::Range { max_value, bounds }, FilterValue::Between { lower, upper }) => {
                if lower > upper {
                    return Err(FilterFlowError::InvalidConfiguration(format!(
                        "filter '{}': lower bound {lower} is greater than upper bound {upper}",
                        self.human_name
                    )));
                }
                if lower < 0 || upper > *max_value {
                    tracing::debug!(
                        "filter '{}': bounds {lower}..={upper} exceed slider options 0..={}",
                        self.human_name,
                        max_value
                    );
                }
                *bounds = Some((lower, upper));
                Ok(())
            }
            (_, other) => Err(FilterFlowError::InvalidConfiguration(format!(
                "filter '{}' is a {} filter but received a {} value ({other})",
                self.human_name,
                kind,
                other.kind()
            ))),
        }
    }

    /// Forgets the current value.
    pub fn clear_value(&mut self) {
        match &mut self.param {
            FilterParam::Equality { value } => *value = None,
            FilterParam::Range { bounds, .. } => *bounds = None,
        }
    }

    /// Parses raw user input into a value of this filter's kind.
    pub fn parse_value(&self, raw: &str) -> FilterFlowResult<FilterValue> {
        match self.kind() {
            FilterKind::Equality => Ok(FilterValue::Equals(Scalar::parse(raw))),
            FilterKind::Range => {
                let captures = RANGE_PATTERN.captures(raw).ok_or_else(|| {
                    FilterFlowError::InvalidConfiguration(format!(
                        "filter '{}' expects a range like '2..5', got '{raw}'",
                        self.human_name
                    ))
                })?;

                let bound = |index: usize| -> FilterFlowResult<i64> {
                    captures[index].parse::<i64>().map_err(|e| {
                        FilterFlowError::InvalidConfiguration(format!(
                            "filter '{}': invalid bound '{}': {e}",
                            self.human_name, &captures[index]
                        ))
                    })
                };

                Ok(FilterValue::Between {
                    lower: bound(1)?,
                    upper: bound(2)?,
                })
            }
        }
    }

    /// Builds the predicate for the current value against `dataset`.
    ///
    /// Fails with `InvalidConfiguration` when no value was supplied, and with
    /// `ColumnNotFound` when the target column is missing from `dataset`.
    pub fn evaluate(&self, dataset: &Dataset) -> FilterFlowResult<Expr> {
        // Check for a value first; the schema lookup may hit the backend.
        match &self.param {
            FilterParam::Equality { value: Some(scalar) } => {
                let column = col(dataset.resolve_column(&self.table_column)?);
                Ok(column.eq(scalar.to_lit()))
            }
            FilterParam::Range {
                bounds: Some((lower, upper)),
                ..
            } => {
                let column = col(dataset.resolve_column(&self.table_column)?);
                Ok(column
                    .clone()
                    .gt_eq(lit(*lower))
                    .and(column.lt_eq(lit(*upper))))
            }
            _ => Err(FilterFlowError::InvalidConfiguration(format!(
                "filter '{}' has no value; a value must be supplied before it is applied",
                self.human_name
            ))),
        }
    }

    /// Returns `dataset` restricted to the rows matching this filter.
    pub fn apply(&self, dataset: &Dataset) -> FilterFlowResult<Dataset> {
        let predicate = self.evaluate(dataset)?;
        Ok(dataset.filter(predicate))
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
