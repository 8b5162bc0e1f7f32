use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

/**
Result type to simplify function signatures.

This is a custom result type that uses our custom `FilterFlowError` for the error type.

Functions can return `FilterFlowResult<T>` and then use `?` to automatically propagate errors.
*/
pub type FilterFlowResult<T> = Result<T, FilterFlowError>;

/**
Custom error type for filter-flow.

This enum defines all the possible errors that can occur while loading the base table,
configuring filters, building the chain and exporting its result.

We use the `thiserror` crate to derive the `Error` trait and automatically
implement `Display` using the `#[error(...)]` attribute.
*/
#[derive(Error, Debug)]
pub enum FilterFlowError {
    // Wrapper for standard IO errors.
    // The #[from] attribute automatically converts io::Error to FilterFlowError::Io.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Wrapper for Polars errors (from the Polars library).
    // Backend failures (bad casts, unreadable files, invalid plans) pass through unchanged.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    // Errors serializing the Sankey figure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A filter was evaluated with an unsupported parameter kind or without a value.
    /// This indicates a caller ordering bug and is never retried.
    #[error("Invalid filter configuration: {0}")]
    InvalidConfiguration(String),

    /// A filter name that is not part of the catalog.
    #[error("Unknown filter: '{0}'")]
    UnknownFilter(String),

    /// The target column of a filter does not exist in the dataset.
    #[error("Column '{column}' not found. Available columns: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The requested base table is not served by the data source.
    #[error("Table '{name}' not found. Available tables: {available:?}")]
    TableNotFound {
        name: String,
        available: Vec<String>,
    },

    // Errors encountered while parsing CSV data (e.g., inconsistent columns, invalid data).
    #[error("CSV parsing error: {0}")]
    CsvParsing(String),

    // Errors related to the file type (e.g., unsupported file extension, incorrect file format).
    #[error("File type error: {0}")]
    FileType(String),

    // Indicates an invalid CSV delimiter was provided (empty or too long).
    #[error("Invalid CSV delimiter: '{0}'")]
    InvalidDelimiter(String),

    #[error("Invalid value for command-line argument '{arg_name}': {reason}")]
    InvalidArgument {
        arg_name: String, // Context about *which* argument failed
        reason: String,   // The specific error reason
    },

    // A catch-all for other, less specific errors not covered by specific variants.
    #[error("Other error: {0}")]
    Other(String),
}

// Implementation of the From trait to convert a String into a FilterFlowError.
impl From<String> for FilterFlowError {
    fn from(err: String) -> FilterFlowError {
        // Prefer using specific error variants when possible, fallback to Other.
        FilterFlowError::Other(err)
    }
}
