//! Reader for delimited input files

use crate::detect::{detect_for_file, Delimiter};
use crate::error::{Error, Result};
use crate::table::{ColumnSchema, InputFile, Row, Table};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use tracing::{debug, warn};

/// How data rows whose field count differs from the header are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Pad short rows with empty cells and drop extra trailing empty fields.
    /// Extra fields holding data are still an error.
    #[default]
    Lenient,
    /// Any field-count mismatch is an error
    Strict,
}

/// Options for reading one input file
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Use this delimiter instead of detecting one
    pub delimiter: Option<Delimiter>,
    /// Field-count mismatch handling
    pub row_policy: RowPolicy,
}

/// Read and parse an input file into a Table
pub fn parse_csv(input: InputFile, options: &ReadOptions) -> Result<Table> {
    let bytes = fs::read(&input.path).map_err(|e| Error::FileRead {
        path: input.path.clone(),
        source: e,
    })?;

    let (content, encoding) = decode(&bytes);
    if encoding != UTF_8 {
        debug!(path = %input.path.display(), encoding = encoding.name(), "decoded input");
    }

    parse_decoded(&content, input, encoding, options)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, input: InputFile, options: &ReadOptions) -> Result<Table> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    parse_decoded(content, input, UTF_8, options)
}

/// Decode raw file bytes to text
///
/// A byte-order mark selects its encoding and is stripped. Without one the
/// bytes are taken as UTF-8, falling back to Windows-1252 (a superset of
/// Latin-1 that accepts any byte) when they are not valid UTF-8.
fn decode(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            warn!(encoding = encoding.name(), "invalid byte sequences replaced while decoding");
        }
        return (text.into_owned(), encoding);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), UTF_8),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), WINDOWS_1252)
        }
    }
}

fn parse_decoded(
    content: &str,
    input: InputFile,
    encoding: &'static Encoding,
    options: &ReadOptions,
) -> Result<Table> {
    let path = input.path.clone();
    let delimiter = match options.delimiter {
        Some(d) => d,
        None => detect_for_file(&path, content)?,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Field counts are reconciled below
        .delimiter(delimiter.as_byte())
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let names: Vec<&str> = headers.iter().map(str::trim).collect();
    if names.is_empty() {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }
    if let Some(column) = ColumnSchema::first_duplicate(names.iter().copied()) {
        return Err(Error::DuplicateColumn {
            path,
            column: column.to_string(),
        });
    }
    let columns: ColumnSchema = names.into_iter().collect();

    let mut rows = Vec::new();
    let mut padded = 0usize;
    let mut trimmed = 0usize;

    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line());

        // A whitespace-only line is a blank line, not a row of one cell
        if columns.len() > 1 && record.len() == 1 && record[0].trim().is_empty() {
            debug!(path = %path.display(), line, "skipping blank line");
            continue;
        }

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        let found = cells.len();
        let expected = columns.len();

        match found.cmp(&expected) {
            Ordering::Equal => {}
            Ordering::Less if options.row_policy == RowPolicy::Lenient => {
                debug!(path = %path.display(), line, found, expected, "padding short row");
                cells.resize(expected, String::new());
                padded += 1;
            }
            Ordering::Greater
                if options.row_policy == RowPolicy::Lenient
                    && cells[expected..].iter().all(|c| c.is_empty()) =>
            {
                debug!(path = %path.display(), line, found, expected, "dropping empty trailing fields");
                cells.truncate(expected);
                trimmed += 1;
            }
            _ => {
                return Err(Error::MalformedRow {
                    path,
                    line,
                    expected,
                    found,
                });
            }
        }

        rows.push(Row::new(cells));
    }

    if padded > 0 || trimmed > 0 {
        warn!(
            path = %path.display(),
            padded,
            trimmed,
            "rows with irregular field counts were reconciled"
        );
    }

    debug!(
        path = %path.display(),
        %delimiter,
        columns = columns.len(),
        rows = rows.len(),
        "parsed input"
    );

    Ok(Table {
        source: input,
        columns,
        rows,
        delimiter,
        encoding: encoding.name().to_string(),
    })
}
