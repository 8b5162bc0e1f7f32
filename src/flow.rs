//! Sankey flow diagram derived from a `DatasetSequence`.
//!
//! Nodes are `"Original data"`, one `"Filter: '<name>'"` per applied filter, and
//! `"Result"`. Edge *i* links node *i* to node *i + 1* and is weighted by the row
//! count of `sequence[i]`, i.e. by how many rows flowed *into* that step.

use crate::{DatasetSequence, FilterFlowResult};

use serde::Serialize;
use std::fmt;

/// Label of the first node.
pub const ORIGINAL_DATA_LABEL: &str = "Original data";

/// Label of the last node.
pub const RESULT_LABEL: &str = "Result";

/// Node labels: `["Original data", "Filter: '<name>'", ..., "Result"]`.
pub fn labels<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    std::iter::once(ORIGINAL_DATA_LABEL.to_string())
        .chain(
            names
                .into_iter()
                .map(|name| format!("Filter: '{}'", name.as_ref())),
        )
        .chain(std::iter::once(RESULT_LABEL.to_string()))
        .collect()
}

/// Edges of the Sankey diagram, in Plotly's column layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SankeyLinks {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub value: Vec<usize>,
}

impl SankeyLinks {
    /// Builds `counts.len() - 1` edges from the row counts of a sequence.
    ///
    /// The last count is never used as a weight: each edge carries its upstream count.
    pub fn from_counts(counts: &[usize]) -> Self {
        let edges = counts.len().saturating_sub(1);

        SankeyLinks {
            source: (0..edges).collect(),
            target: (1..=edges).collect(),
            value: counts[..edges].to_vec(),
        }
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// `(source, target, value)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.source
            .iter()
            .zip(&self.target)
            .zip(&self.value)
            .map(|((&source, &target), &value)| (source, target, value))
    }
}

/// Edges for `sequence`: one per applied filter.
pub fn links(sequence: &DatasetSequence) -> FilterFlowResult<SankeyLinks> {
    Ok(SankeyLinks::from_counts(&sequence.row_counts()?))
}

/// Labels and links, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDiagram {
    pub labels: Vec<String>,
    pub links: SankeyLinks,
}

// Plotly figure layout: node padding 15, thickness 20, thin black outline.
#[derive(Serialize)]
struct PlotlyFigure<'a> {
    data: [SankeyTrace<'a>; 1],
}

#[derive(Serialize)]
struct SankeyTrace<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    node: SankeyNode<'a>,
    link: &'a SankeyLinks,
}

#[derive(Serialize)]
struct SankeyNode<'a> {
    pad: u32,
    thickness: u32,
    line: NodeLine,
    label: &'a [String],
}

#[derive(Serialize)]
struct NodeLine {
    color: &'static str,
    width: f64,
}

impl FlowDiagram {
    /// Derives the diagram of `sequence`, whose filters are called `names`.
    pub fn new<I, S>(names: I, sequence: &DatasetSequence) -> FilterFlowResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(FlowDiagram {
            labels: labels(names),
            links: links(sequence)?,
        })
    }

    /// Plotly-compatible figure JSON (`{"data": [{"type": "sankey", ...}]}`).
    pub fn to_plotly_json(&self) -> FilterFlowResult<String> {
        let figure = PlotlyFigure {
            data: [SankeyTrace {
                kind: "sankey",
                node: SankeyNode {
                    pad: 15,
                    thickness: 20,
                    line: NodeLine {
                        color: "black",
                        width: 0.5,
                    },
                    label: &self.labels,
                },
                link: &self.links,
            }],
        };

        Ok(serde_json::to_string_pretty(&figure)?)
    }
}

impl fmt::Display for FlowDiagram {
    /// One line per edge: `Original data --[100]--> Filter: 'Tenure'`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |index: usize| self.labels.get(index).map_or("?", String::as_str);

        for (source, target, value) in self.links.edges() {
            writeln!(f, "{} --[{}]--> {}", label(source), value, label(target))?;
        }
        Ok(())
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
