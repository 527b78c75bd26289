//! Delimiter detection for input files
//!
//! Counts each candidate delimiter per record over a small sample and picks
//! the one whose count is highest and identical on every sampled record.
//! Occurrences inside double-quoted sections are not counted, so a comma
//! inside `"Silva, Ana"` does not vote for comma.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Maximum number of bytes inspected per file
pub const SAMPLE_BYTES: usize = 4096;

/// Maximum number of records inspected per file
pub const SAMPLE_RECORDS: usize = 10;

/// A supported field delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    /// Candidates in tie-break order
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    /// The delimiter as a byte, as the csv crate expects it
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }

    /// The delimiter as a char
    pub fn as_char(self) -> char {
        self.as_byte() as char
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "tab"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "," => Ok(Delimiter::Comma),
            ";" => Ok(Delimiter::Semicolon),
            "|" => Ok(Delimiter::Pipe),
            "\t" | "\\t" => Ok(Delimiter::Tab),
            _ if s.eq_ignore_ascii_case("tab") => Ok(Delimiter::Tab),
            _ => Err(Error::InvalidDelimiter(s.to_string())),
        }
    }
}

/// Detect the delimiter of `content`, or `None` if no candidate occurs
pub fn detect_delimiter(content: &str) -> Option<Delimiter> {
    choose(&sample_records(content)).map(|(delimiter, _)| delimiter)
}

/// Detect the delimiter of a file's decoded content
///
/// Fails with [`Error::Detection`] when no candidate occurs in the sample;
/// there is no silent default.
pub fn detect_for_file(path: &Path, content: &str) -> Result<Delimiter> {
    let records = sample_records(content);
    match choose(&records) {
        Some((delimiter, true)) => {
            debug!(
                path = %path.display(),
                %delimiter,
                records = records.len(),
                "detected delimiter"
            );
            Ok(delimiter)
        }
        Some((delimiter, false)) => {
            warn!(
                path = %path.display(),
                %delimiter,
                "no delimiter has a consistent count across sampled records, using the header's most frequent"
            );
            Ok(delimiter)
        }
        None => Err(Error::Detection {
            path: path.to_path_buf(),
        }),
    }
}

/// Per-record candidate counts, in `Delimiter::CANDIDATES` order
type Counts = [usize; 4];

/// Split the head of `content` into records and count candidates in each
///
/// Newlines inside quotes do not end a record. Blank records are skipped.
/// When the sample is cut short, the trailing partial record is dropped
/// unless it is the only record, as with a header wider than the sample.
fn sample_records(content: &str) -> Vec<Counts> {
    let mut end = content.len().min(SAMPLE_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = end < content.len();
    let sample = &content[..end];

    let mut records = Vec::new();
    let mut counts: Counts = [0; 4];
    let mut blank = true;
    let mut in_quotes = false;

    for c in sample.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                blank = false;
            }
            '\n' if !in_quotes => {
                if !blank {
                    records.push(counts);
                }
                counts = [0; 4];
                blank = true;
            }
            _ => {
                if !in_quotes {
                    if let Some(i) = Delimiter::CANDIDATES.iter().position(|d| d.as_char() == c) {
                        counts[i] += 1;
                    }
                }
                if !c.is_whitespace() {
                    blank = false;
                }
            }
        }
    }

    if !blank && (!truncated || records.is_empty()) {
        records.push(counts);
    }

    records.truncate(SAMPLE_RECORDS);
    records
}

/// Pick a delimiter; the flag tells whether its count was consistent
fn choose(records: &[Counts]) -> Option<(Delimiter, bool)> {
    let header = records.first()?;

    let mut best: Option<(usize, usize)> = None;
    for i in 0..Delimiter::CANDIDATES.len() {
        let n = header[i];
        if n == 0 || !records.iter().all(|r| r[i] == n) {
            continue;
        }
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((i, n));
        }
    }
    if let Some((i, _)) = best {
        return Some((Delimiter::CANDIDATES[i], true));
    }

    // First maximum wins ties
    let mut fallback: Option<(usize, usize)> = None;
    for (i, &n) in header.iter().enumerate() {
        if n > 0 && fallback.map_or(true, |(_, best_n)| n > best_n) {
            fallback = Some((i, n));
        }
    }
    fallback.map(|(i, _)| (Delimiter::CANDIDATES[i], false))
}
