#![warn(clippy::all)]

use filter_flow::{
    Arguments, Dashboard, DashboardConfig, FileSource, FilterFlowResult, FilterPanel,
};
use std::{fs, process::ExitCode};
use tracing::error;

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_chain
cargo run -- --help
cargo run -- customers.csv -f "Current customer=true" -f "Tenure=2..5"
cargo doc --open
cargo b -r && cargo install --path=.
*/

const IDLE_MESSAGE: &str = "Please enable a filter in the sidebar to show transformations";

fn main() -> ExitCode {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("filter-flow failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Arguments) -> FilterFlowResult<()> {
    let config = DashboardConfig::new(args)?;

    let source = FileSource::new(&config.path, &config.table_name, &config.csv_delimiter)?;
    let dashboard = Dashboard::new(&source, &config.table_name)
        .with_preview(config.sample_rows, config.seed);

    let mut panel = dashboard.build_panel(&config.catalog)?;

    if config.list_filters {
        print_catalog(&panel);
        return Ok(());
    }

    config.apply_selections(&mut panel)?;

    // RUST_LOG=debug cargo run -- customers.csv -f Tenure
    tracing::debug!("main()\nFilterPanel: {panel:#?}");

    let Some(view) = dashboard.refresh(&panel)? else {
        println!("{IDLE_MESSAGE}");
        return Ok(());
    };

    println!("{}\n", view.preview);
    println!("Data flow:\n{}", view.diagram);
    println!("Statement sequence:\n{}", view.audit.to_markdown());

    if let Some(path) = &config.sankey {
        fs::write(path, view.diagram.to_plotly_json()?)?;
        tracing::info!("Sankey figure written to {}", path.display());
    }

    if let Some(path) = &config.output {
        let rows = dashboard.export(&panel, path)?;
        println!("\nExported {rows} rows to {}", path.display());
    }

    Ok(())
}

/// One line per filter: name, column, kind and widget.
fn print_catalog(panel: &FilterPanel) {
    for filter in panel.filters() {
        let bounds = filter
            .range_options()
            .map(|range| format!(" [{}..={}]", range.start(), range.end()))
            .unwrap_or_default();

        println!(
            "{} (column: {}, kind: {}){}\n    {}",
            filter.human_name(),
            filter.table_column(),
            filter.kind(),
            bounds,
            filter.widget_label()
        );
    }
}
