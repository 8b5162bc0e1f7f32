use crate::{
    DEFAULT_CSV_DELIMITER, DEFAULT_EXPORT_FILE_NAME, DEFAULT_SAMPLE_ROWS, DEFAULT_TABLE_NAME,
    FilterFlowError, FilterFlowResult, FilterSpec,
};

use clap::Parser;
use std::path::PathBuf;

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" filter-flow customers.csv -l"#;
const EX2: &str = r#" filter-flow customers.csv -f "Current customer=true" -f "Tenure=2..5""#;
const EX3: &str = r#" filter-flow customers.parquet -f Tenure -o customers_filtered.csv --sankey flow.json"#;
const EX4: &str = r#" filter-flow sales.csv -t SALES -D "Region:region:equality" -f "Region=North""#;

/// Command-line arguments for the filter-flow dashboard.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}\n{EX4}")
)]
pub struct Arguments {
    /// CSV delimiter character. [Default: ',']
    #[arg(
        short = 'd',
        long,
        default_value = DEFAULT_CSV_DELIMITER,
        help = "CSV delimiter character",
        long_help = "Sets the CSV delimiter.\n\
        Auto-detect tries common separators (, ; | \\t) if the header parses as one column.",
        value_parser = validate_delimiter
    )]
    pub delimiter: String,

    /// Custom filter definitions; any definition replaces the built-in catalog.
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME:COLUMN:KIND",
        help = "Define a filter (KIND: equality or range); repeatable",
        long_help = "\
Adds a filter to the catalog. When at least one definition is given, the built-in
customer filters are not offered.

KIND is one of:
- equality (aliases: eq, checkbox)
- range (aliases: between, slider, select_slider)

Example: -D \"Weekly workouts:average_weekly_workout_count:range\"
",
        action = clap::ArgAction::Append,
        value_parser = validate_definition
    )]
    pub definitions: Vec<String>,

    /// Filters to enable, in order, each with an optional value.
    #[arg(
        short = 'f',
        long = "filter",
        value_name = "NAME[=VALUE]",
        help = "Enable a filter, optionally with a value; repeatable, order matters",
        long_help = "\
Enables the named filter. Filters are applied in the order they are given.

VALUE depends on the filter kind:
- equality: true, false, an integer or text
- range: LOWER..UPPER, LOWER..=UPPER or LOWER,UPPER (inclusive bounds)

Without a value, the widget default is used: false for equality filters and the
full range 0..=max for range filters.
",
        action = clap::ArgAction::Append,
        value_parser = validate_selection
    )]
    pub filters: Vec<String>,

    /// List the filter catalog and exit.
    #[arg(
        short = 'l',
        long,
        help = "List the available filters and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list: bool,

    /// Path of the CSV export.
    #[arg(
        short = 'o',
        long,
        value_name = "CSV_PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_EXPORT_FILE_NAME,
        help = "Export the final dataset to CSV [Default path: customers.csv]",
        long_help = "Writes the result of the filter chain to CSV_PATH.\n\
        Without a value, writes customers.csv in the current directory."
    )]
    pub output: Option<PathBuf>,

    /// Path to the data file (CSV, JSON, NDJSON, Parquet).
    #[arg(
        value_name = "FILE_PATH",
        required = true,
        help = "Path to data file (CSV/JSON/NDJSON/Parquet)",
        long_help = "Path to the input data file holding the base table."
    )]
    pub path: PathBuf,

    /// Number of preview rows. [Default: 5]
    #[arg(
        short = 's',
        long,
        value_name = "ROWS",
        default_value_t = DEFAULT_SAMPLE_ROWS,
        help = "Number of randomly sampled rows to preview"
    )]
    pub sample: usize,

    /// Seed of the preview sampling.
    #[arg(
        long,
        value_name = "SEED",
        help = "Seed for the preview sample (random when omitted)"
    )]
    pub seed: Option<u64>,

    /// Path of the Sankey figure JSON.
    #[arg(
        long,
        value_name = "JSON_PATH",
        help = "Write the flow diagram as Plotly JSON",
        long_help = "Writes a Plotly figure ({\"data\": [{\"type\": \"sankey\", ...}]}) to JSON_PATH."
    )]
    pub sankey: Option<PathBuf>,

    /// Name of the base table. [Default: CUSTOMERS]
    #[arg(
        short = 't',
        long,
        value_name = "TABLE_NAME",
        default_value = DEFAULT_TABLE_NAME,
        help = "Name of the base table [Default: CUSTOMERS]",
        long_help = "The data file is exposed under this name (compared case-insensitively)."
    )]
    pub table_name: String,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }
}

// --- Validation Functions ---

/// The delimiter must be a single byte.
fn validate_delimiter(delimiter: &str) -> FilterFlowResult<String> {
    if delimiter.len() == 1 {
        Ok(delimiter.to_string())
    } else {
        Err(FilterFlowError::InvalidArgument {
            arg_name: "--delimiter".to_string(),
            reason: format!("'{delimiter}' must be exactly one byte"),
        })
    }
}

fn validate_definition(definition: &str) -> FilterFlowResult<String> {
    FilterSpec::parse_definition(definition)
        .map(|_| definition.to_string())
        .map_err(|e| FilterFlowError::InvalidArgument {
            arg_name: "--define".to_string(),
            reason: e.to_string(),
        })
}

/// `NAME[=VALUE]` with a non-empty name.
fn validate_selection(selection: &str) -> FilterFlowResult<String> {
    let name = selection.split_once('=').map_or(selection, |(name, _)| name);

    if name.trim().is_empty() {
        return Err(FilterFlowError::InvalidArgument {
            arg_name: "--filter".to_string(),
            reason: format!("'{selection}' has no filter name"),
        });
    }
    Ok(selection.to_string())
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_args
#[cfg(test)]
mod tests_args {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_args_path_only() {
        let args = Arguments::parse_from(["filter-flow", "customers.csv"]);

        assert_eq!(args.path, PathBuf::from("customers.csv"));
        // Check defaults
        assert_eq!(args.delimiter, DEFAULT_CSV_DELIMITER);
        assert_eq!(args.table_name, "CUSTOMERS");
        assert_eq!(args.sample, 5);
        assert!(args.filters.is_empty());
        assert!(args.definitions.is_empty());
        assert!(!args.list);
        assert_eq!(args.output, None);
        assert_eq!(args.sankey, None);
        assert_eq!(args.seed, None);
    }

    #[test]
    fn test_args_all_options_short() {
        let args = Arguments::parse_from([
            "filter-flow",
            "-d",
            ";",
            "-t",
            "SALES",
            "-D",
            "Region:region:equality",
            "-f",
            "Region=North",
            "-s",
            "10",
            "-o",
            "out.csv",
            "-l",
            "sales.csv",
        ]);

        assert_eq!(args.path, PathBuf::from("sales.csv"));
        assert_eq!(args.delimiter, ";");
        assert_eq!(args.table_name, "SALES");
        assert_eq!(args.definitions, ["Region:region:equality"]);
        assert_eq!(args.filters, ["Region=North"]);
        assert_eq!(args.sample, 10);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert!(args.list);
    }

    #[test]
    fn test_args_filters_keep_their_order() {
        let args = Arguments::parse_from([
            "filter-flow",
            "--filter",
            "Tenure=2..5",
            "--filter",
            "Current customer",
            "--seed",
            "7",
            "--sankey",
            "flow.json",
            "customers.csv",
        ]);

        assert_eq!(args.filters, ["Tenure=2..5", "Current customer"]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.sankey, Some(PathBuf::from("flow.json")));
    }

    #[test]
    fn test_args_output_without_value_uses_default_file_name() {
        let args = Arguments::parse_from(["filter-flow", "customers.parquet", "-o"]);
        assert_eq!(args.output, Some(PathBuf::from(DEFAULT_EXPORT_FILE_NAME)));

        let args = Arguments::parse_from(["filter-flow", "--output", "out.csv", "customers.parquet"]);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_args_rejects_invalid_values() {
        assert!(Arguments::try_parse_from(["filter-flow"]).is_err());
        assert!(Arguments::try_parse_from(["filter-flow", "-d", ";;", "a.csv"]).is_err());
        assert!(Arguments::try_parse_from(["filter-flow", "-f", "=true", "a.csv"]).is_err());
        assert!(Arguments::try_parse_from(["filter-flow", "-D", "Tenure:years", "a.csv"]).is_err());
        assert!(
            Arguments::try_parse_from(["filter-flow", "-D", "Tenure:years:fuzzy", "a.csv"]).is_err()
        );
    }
}
