//! File-type detection for the base table reader and the CSV export.

use crate::PathExtension;
use std::path::Path;

/// Format of a data file, inferred from its extension (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileExtension {
    /// CSV file extension.
    Csv,
    /// Json file extension.
    Json,
    /// Newline-Delimited Json file extension.
    NDJson,
    /// Parquet file extension.
    Parquet,
    /// Unknown file extension, storing the extension as a string.
    Unknown(String),
    /// Missing file extension, when no extension is present in the path.
    Missing,
}

impl FileExtension {
    /// Determines the file extension from a given path.
    pub fn from_path(path: &Path) -> Self {
        match path.extension_as_lowercase().as_deref() {
            Some("csv") => FileExtension::Csv,
            Some("json") => FileExtension::Json,
            Some("ndjson") | Some("jsonl") => FileExtension::NDJson,
            Some("parquet") => FileExtension::Parquet,
            Some(ext) => FileExtension::Unknown(ext.to_owned()),
            None => FileExtension::Missing,
        }
    }

    /// Whether an export may be written to a file of this type: `.csv`, or a bare
    /// name without extension.
    pub fn accepts_csv_export(&self) -> bool {
        matches!(self, FileExtension::Csv | FileExtension::Missing)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
