//! Core table types for representing parsed input files

use crate::detect::Delimiter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix stripped from input file names to derive their short name
pub const DEFAULT_SUFFIX: &str = "_agrupado.csv";

/// An input file and the label its rows carry in the provenance column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Path as given by the caller
    pub path: PathBuf,
    /// File name with the known suffix removed
    pub short_name: String,
}

impl InputFile {
    /// Create an input file, deriving its short name from `suffix`
    pub fn new(path: impl Into<PathBuf>, suffix: &str) -> Self {
        let path = path.into();
        let short_name = short_name(&path, suffix);
        Self { path, short_name }
    }
}

/// Derive the short name of a file: its base name minus `suffix`
///
/// The suffix is matched case-insensitively. A base name that does not end
/// with the suffix (or consists only of it) is returned whole.
///
/// Examples:
/// - "dir/1802002_agrupado.csv" -> "1802002"
/// - "11802004_AGRUPADO.CSV" -> "11802004"
/// - "extra.csv" -> "extra.csv"
pub fn short_name(path: &Path, suffix: &str) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    if suffix.is_empty() || base.len() <= suffix.len() {
        return base;
    }

    let split = base.len() - suffix.len();
    if base.is_char_boundary(split) && base[split..].to_lowercase() == suffix.to_lowercase() {
        base[..split].to_string()
    } else {
        base
    }
}

/// An ordered list of unique column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present; returns whether it was added
    pub fn push_unique(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Check whether a column exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of a column, if present
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over column names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Column names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the first name that occurs more than once, if any
    pub(crate) fn first_duplicate<'a, I>(names: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        names.into_iter().find(|n| !seen.insert(*n))
    }
}

impl<S: AsRef<str>> FromIterator<S> for ColumnSchema {
    /// Collect names, silently dropping repeats
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut schema = ColumnSchema::new();
        for name in iter {
            schema.push_unique(name.as_ref());
        }
        schema
    }
}

/// A row of data, positionally aligned to its table's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// A parsed table from a single input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// The file this table was read from
    pub source: InputFile,
    /// Header columns, in file order
    pub columns: ColumnSchema,
    /// Row data
    pub rows: Vec<Row>,
    /// Field delimiter used to parse the file
    pub delimiter: Delimiter,
    /// Name of the text encoding the bytes were decoded with
    pub encoding: String,
}

impl Table {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look up a cell by column name
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Option<&'a str> {
        self.columns.position(column).and_then(|i| row.get(i))
    }
}
