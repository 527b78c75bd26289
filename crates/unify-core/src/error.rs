//! Error types for unify-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while merging files
///
/// Every variant is fatal to a run: a single bad input aborts the merge.
#[derive(Debug, Error)]
pub enum Error {
    /// The run was given no input files
    #[error("no input files given")]
    NoInputs,

    /// An input path does not exist or is not a regular file
    #[error("input file not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No delimiter candidate occurs in the sampled lines
    #[error("cannot determine the delimiter of '{path}': none of , ; tab | occurs in its first lines")]
    Detection { path: PathBuf },

    /// Structural problem with a file that is not a single row
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The same column name appears twice in one header
    #[error("duplicate column '{column}' in header of '{path}'")]
    DuplicateColumn { path: PathBuf, column: String },

    /// A data row whose field count cannot be reconciled with the header
    #[error("malformed row at line {line} of '{path}': expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The provenance column name is already used by an input column
    #[error("provenance column '{column}' already exists in the input headers; choose another name")]
    ProvenanceCollision { column: String },

    /// The output file could not be created or written
    #[error("failed to write '{path}': {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A forced delimiter outside the supported set
    #[error("invalid delimiter '{0}': expected one of ',', ';', '|' or 'tab'")]
    InvalidDelimiter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
