//! Delimited-text export of the final dataset.

use crate::{Dataset, FileExtension, FilterFlowError, FilterFlowResult};

use polars::prelude::*;
use std::{fs, path::Path};

/// File name used when `--output` is given without a path.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "customers.csv";

/// Encodes `df` as UTF-8 CSV with a header row.
pub fn to_csv_bytes(df: &DataFrame, separator: u8) -> FilterFlowResult<Vec<u8>> {
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(separator)
        .finish(&mut df.clone())?;
    Ok(buffer)
}

/// Materializes `dataset` and writes it to `path` as CSV.
///
/// `path` must carry a `.csv` extension (or none at all).
///
/// ### Returns
/// The number of rows written.
pub fn export_csv(dataset: &Dataset, path: &Path, separator: u8) -> FilterFlowResult<usize> {
    if !FileExtension::from_path(path).accepts_csv_export() {
        return Err(FilterFlowError::FileType(format!(
            "`{}`: export only writes CSV files",
            path.display()
        )));
    }

    let df = dataset.collect()?;
    fs::write(path, to_csv_bytes(&df, separator)?)?;

    tracing::info!("Exported {} rows to {}", df.height(), path.display());
    Ok(df.height())
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
