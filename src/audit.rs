//! The statement sequence: which query produced each step of the chain.

use crate::{DatasetSequence, FilterFlowError, FilterFlowResult};

/// One step of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    /// 1-based step number.
    pub step: usize,
    /// Human name of the filter applied at this step.
    pub filter_label: String,
    /// Query plan that produced `sequence[step]`.
    pub query_text: String,
}

/// Ordered list of `AuditRow`s, one per applied filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditTrail {
    pub rows: Vec<AuditRow>,
}

impl AuditTrail {
    /// Pairs each filter name with the dataset it produced.
    ///
    /// `names` holds the per-filter human names only (no `"Original data"` or
    /// `"Result"` bookends), so `names.len()` must equal `sequence.len() - 1`.
    pub fn build<I, S>(names: I, sequence: &DatasetSequence) -> FilterFlowResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let steps = sequence.len().saturating_sub(1);

        if names.len() != steps {
            return Err(FilterFlowError::InvalidConfiguration(format!(
                "audit trail needs one name per applied filter: got {} names for {} steps",
                names.len(),
                steps
            )));
        }

        let rows = names
            .iter()
            .zip(sequence.iter().skip(1))
            .enumerate()
            .map(|(index, (name, dataset))| {
                Ok(AuditRow {
                    step: index + 1,
                    filter_label: name.as_ref().to_string(),
                    query_text: dataset.query_text()?,
                })
            })
            .collect::<FilterFlowResult<Vec<AuditRow>>>()?;

        Ok(AuditTrail { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Markdown table with one row per step; each query is flattened onto one line.
    pub fn to_markdown(&self) -> String {
        let mut markdown = String::from(
            "| number | filter name | query, transformation |\n\
             | ------ | ----------- | --------------------- |",
        );

        for row in &self.rows {
            let label = escape_cell(&row.filter_label);
            let query = escape_cell(&flatten_query(&row.query_text));
            markdown.push_str(&format!("\n| {} | {} | ```{}``` |", row.step, label, query));
        }

        markdown
    }
}

/// Escapes the column separator of a markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Collapses a multi-line plan into one line of single-spaced tokens.
fn flatten_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
