//! Data sources able to serve the base table of the dashboard.
//!
//! The chain builder only sees the `TableSource` trait; the concrete source is chosen
//! by the caller (a file on disk for the binary, in-memory frames for tests and
//! embedders).

use crate::{
    Dataset, FileExtension, FilterFlowError, FilterFlowResult, UniqueElements,
};

use polars::prelude::*;
use std::{
    collections::HashMap,
    fs::File,
    num::NonZero,
    path::{Path, PathBuf},
};

/// Default delimiter used for CSV parsing if not specified or detected.
pub static DEFAULT_CSV_DELIMITER: &str = ",";

/// Default name of the base table.
pub static DEFAULT_TABLE_NAME: &str = "CUSTOMERS";

const DEFAULT_INFER_SCHEMA_ROWS: usize = 200;

/// Capability to load a named base table.
pub trait TableSource {
    /// Loads the table called `name`. Fails with `TableNotFound` if the source
    /// does not serve it.
    fn load_base_table(&self, name: &str) -> FilterFlowResult<Dataset>;

    /// Names of the tables this source can serve.
    fn table_names(&self) -> Vec<String>;
}

// --- FileSource ---

/// Serves a single table from a CSV, JSON, NDJSON or Parquet file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    /// The canonical, absolute path to the data file.
    pub absolute_path: PathBuf,
    /// The name the file is served under (matched case-insensitively).
    pub table_name: String,
    /// The character used to separate columns in a CSV file.
    pub csv_delimiter: String,
    /// Maximum rows to scan for schema inference (CSV, JSON, NDJson).
    pub infer_schema_rows: usize,
}

impl Default for FileSource {
    fn default() -> Self {
        FileSource {
            absolute_path: PathBuf::new(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            csv_delimiter: DEFAULT_CSV_DELIMITER.to_string(),
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
        }
    }
}

impl FileSource {
    /// Creates a source serving `path` under `table_name`.
    ///
    /// The path must exist; it is canonicalized immediately.
    pub fn new(path: &Path, table_name: &str, csv_delimiter: &str) -> FilterFlowResult<Self> {
        Ok(FileSource {
            absolute_path: path.canonicalize()?,
            table_name: table_name.to_string(),
            csv_delimiter: csv_delimiter.to_string(),
            ..Default::default()
        })
    }

    /// Builds the lazy plan for the file according to its extension.
    fn scan(&self) -> FilterFlowResult<LazyFrame> {
        let extension = FileExtension::from_path(&self.absolute_path);

        let plan = match &extension {
            FileExtension::Csv => self.scan_csv()?,
            FileExtension::Json => self.read_json()?,
            FileExtension::NDJson => self.scan_ndjson()?,
            FileExtension::Parquet => self.scan_parquet()?,
            FileExtension::Unknown(ext) => {
                return Err(FilterFlowError::FileType(format!(
                    "Unsupported extension: `{}` for file: `{}`",
                    ext,
                    self.absolute_path.display()
                )));
            }
            FileExtension::Missing => {
                return Err(FilterFlowError::FileType(format!(
                    "Missing extension for file: `{}`",
                    self.absolute_path.display()
                )));
            }
        };

        tracing::debug!("fn scan(): plan ready for extension {:?}", extension);
        Ok(plan)
    }

    /// Reads a standard JSON file eagerly; Polars has no lazy JSON array scanner.
    fn read_json(&self) -> FilterFlowResult<LazyFrame> {
        tracing::debug!("Reading JSON data from: {}", self.absolute_path.display());
        let file = File::open(&self.absolute_path)?;

        let df = JsonReader::new(file)
            .infer_schema_len(NonZero::new(self.infer_schema_rows))
            .finish()?;

        tracing::debug!("JSON read complete. Shape: {:?}", df.shape());
        Ok(df.lazy())
    }

    fn scan_ndjson(&self) -> FilterFlowResult<LazyFrame> {
        tracing::debug!("Scanning NDJSON data from: {}", self.absolute_path.display());
        let plpath = PlRefPath::try_from_pathbuf(self.absolute_path.clone())?;

        let plan = LazyJsonLineReader::new(plpath)
            .low_memory(false)
            .with_infer_schema_length(NonZero::new(self.infer_schema_rows))
            .with_ignore_errors(true)
            .finish()?;

        Ok(plan)
    }

    fn scan_parquet(&self) -> FilterFlowResult<LazyFrame> {
        tracing::debug!(
            "Scanning Parquet data from: {}",
            self.absolute_path.display()
        );
        let plpath = PlRefPath::try_from_pathbuf(self.absolute_path.clone())?;
        let args = ScanArgsParquet {
            low_memory: false,
            ..Default::default()
        };

        Ok(LazyFrame::scan_parquet(plpath, args)?)
    }

    /// Scans a CSV file, trying common delimiters when the configured one does not
    /// split the header into more than one column.
    fn scan_csv(&self) -> FilterFlowResult<LazyFrame> {
        let initial_separator = self.get_csv_separator()?;

        let mut delimiters_to_try = vec![initial_separator, b',', b';', b'|', b'\t', b':'];
        delimiters_to_try.unique();

        let mut iterator = delimiters_to_try.iter().peekable();

        while let Some(&delimiter) = iterator.next() {
            let is_last_element = iterator.peek().is_none();

            match self.read_csv_header_width(delimiter) {
                // A single column usually means the delimiter is wrong, unless we are out of options.
                Ok(width) if width > 1 || is_last_element => {
                    tracing::debug!(
                        "Delimiter '{}' splits header into {} columns",
                        delimiter as char,
                        width
                    );
                    return self.lazy_csv(delimiter);
                }
                Ok(width) => {
                    tracing::debug!(
                        "Delimiter '{}' yields {} column(s); trying next",
                        delimiter as char,
                        width
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "CSV header read failed with delimiter '{}': {}",
                        delimiter as char,
                        e
                    );
                }
            }
        }

        let msg = format!(
            "Failed to read CSV '{}' with common delimiters. Check format or specify delimiter.",
            self.absolute_path.display()
        );
        let error = FilterFlowError::CsvParsing(msg);
        tracing::error!("{}", error);
        Err(error)
    }

    /// Reads only the header row with `delimiter` and returns the number of columns found.
    fn read_csv_header_width(&self, delimiter: u8) -> FilterFlowResult<usize> {
        let csv_parse_options = CsvParseOptions::default()
            .with_encoding(CsvEncoding::LossyUtf8)
            .with_missing_is_null(true)
            .with_separator(delimiter);

        let df = CsvReadOptions::default()
            .with_parse_options(csv_parse_options)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .with_n_rows(Some(1))
            .try_into_reader_with_file_path(Some(self.absolute_path.clone()))?
            .finish()?;

        Ok(df.width())
    }

    fn lazy_csv(&self, delimiter: u8) -> FilterFlowResult<LazyFrame> {
        let plpath = PlRefPath::try_from_pathbuf(self.absolute_path.clone())?;

        let plan = LazyCsvReader::new(plpath)
            .with_low_memory(false)
            .with_encoding(CsvEncoding::LossyUtf8)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .with_separator(delimiter)
            .with_infer_schema_length(Some(self.infer_schema_rows))
            .with_ignore_errors(true)
            .with_missing_is_null(true)
            .with_rechunk(true)
            .finish()?;

        Ok(plan)
    }

    /// Retrieves the CSV separator byte from the `csv_delimiter` configuration.
    fn get_csv_separator(&self) -> FilterFlowResult<u8> {
        match self.csv_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(FilterFlowError::InvalidDelimiter(self.csv_delimiter.clone())),
        }
    }
}

impl TableSource for FileSource {
    fn load_base_table(&self, name: &str) -> FilterFlowResult<Dataset> {
        if !self.table_name.eq_ignore_ascii_case(name) {
            return Err(FilterFlowError::TableNotFound {
                name: name.to_string(),
                available: self.table_names(),
            });
        }

        let plan = self.scan()?;
        tracing::info!(
            "Loaded table '{}' from {}",
            self.table_name,
            self.absolute_path.display()
        );
        Ok(Dataset::new(self.table_name.clone(), plan))
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.table_name.clone()]
    }
}

// --- MemorySource ---

/// Serves named, in-memory `DataFrame`s. Table names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, (String, DataFrame)>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Registers (or replaces) a table.
    pub fn with_table(mut self, name: &str, df: DataFrame) -> Self {
        self.insert(name, df);
        self
    }

    /// Registers (or replaces) a table.
    pub fn insert(&mut self, name: &str, df: DataFrame) {
        self.tables
            .insert(name.to_uppercase(), (name.to_string(), df));
    }
}

impl TableSource for MemorySource {
    fn load_base_table(&self, name: &str) -> FilterFlowResult<Dataset> {
        let (table_name, df) = self
            .tables
            .get(&name.to_uppercase())
            .ok_or_else(|| FilterFlowError::TableNotFound {
                name: name.to_string(),
                available: self.table_names(),
            })?;

        tracing::debug!("Loaded in-memory table '{}'. Shape: {:?}", table_name, df.shape());
        Ok(Dataset::from_frame(table_name.clone(), df.clone()))
    }

    fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|(name, _)| name.clone()).collect();
        names.sort();
        names
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_sources
#[cfg(test)]
mod tests_sources {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(content: &str, suffix: &str) -> FilterFlowResult<tempfile::NamedTempFile> {
        let mut file = Builder::new().suffix(suffix).tempfile()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn memory_source_is_case_insensitive() -> FilterFlowResult<()> {
        let df = df!("YEARS_TENURE" => &[1i64, 2, 3])?;
        let source = MemorySource::new().with_table("CUSTOMERS", df);

        let dataset = source.load_base_table("customers")?;
        assert_eq!(dataset.name(), "CUSTOMERS");
        assert_eq!(dataset.row_count()?, 3);
        assert_eq!(source.table_names(), vec!["CUSTOMERS".to_string()]);
        Ok(())
    }

    #[test]
    fn memory_source_unknown_table_lists_available_tables() -> FilterFlowResult<()> {
        let df = df!("YEARS_TENURE" => &[1i64])?;
        let source = MemorySource::new().with_table("Customers", df);

        assert!(matches!(
            source.load_base_table("ORDERS"),
            Err(FilterFlowError::TableNotFound { name, available })
                if name == "ORDERS" && available == ["Customers"]
        ));
        Ok(())
    }

    #[test]
    fn file_source_reads_csv_with_configured_delimiter() -> FilterFlowResult<()> {
        let csv = "IS_CURRENT_CUSTOMER,YEARS_TENURE\ntrue,3\nfalse,5\ntrue,1\n";
        let file = write_temp(csv, ".csv")?;

        let source = FileSource::new(file.path(), "CUSTOMERS", ",")?;
        let dataset = source.load_base_table("CUSTOMERS")?;

        assert_eq!(dataset.row_count()?, 3);
        assert_eq!(dataset.schema()?.len(), 2);
        Ok(())
    }

    #[test]
    fn file_source_detects_semicolon_delimiter() -> FilterFlowResult<()> {
        let csv = "IS_CURRENT_CUSTOMER;YEARS_TENURE\ntrue;3\nfalse;5\n";
        let file = write_temp(csv, ".csv")?;

        // Configured with ',', but the file uses ';'.
        let source = FileSource::new(file.path(), "CUSTOMERS", ",")?;
        let dataset = source.load_base_table("customers")?;

        assert_eq!(dataset.schema()?.len(), 2);
        assert_eq!(dataset.row_count()?, 2);
        Ok(())
    }

    #[test]
    fn file_source_rejects_other_table_names() -> FilterFlowResult<()> {
        let file = write_temp("a,b\n1,2\n", ".csv")?;
        let source = FileSource::new(file.path(), "CUSTOMERS", ",")?;

        assert!(matches!(
            source.load_base_table("ORDERS"),
            Err(FilterFlowError::TableNotFound { available, .. }) if available == ["CUSTOMERS"]
        ));
        Ok(())
    }

    #[test]
    fn file_source_rejects_unknown_extension() -> FilterFlowResult<()> {
        let file = write_temp("a,b\n1,2\n", ".xlsx")?;
        let source = FileSource::new(file.path(), "CUSTOMERS", ",")?;

        assert!(matches!(
            source.load_base_table("CUSTOMERS"),
            Err(FilterFlowError::FileType(_))
        ));
        Ok(())
    }

    #[test]
    fn invalid_delimiter_is_reported() -> FilterFlowResult<()> {
        let file = write_temp("a,b\n1,2\n", ".csv")?;
        let source = FileSource::new(file.path(), "CUSTOMERS", ";;")?;

        assert!(matches!(
            source.load_base_table("CUSTOMERS"),
            Err(FilterFlowError::InvalidDelimiter(d)) if d == ";;"
        ));
        Ok(())
    }
}
