//! unify-core: Core library for merging delimited files on their column union
//!
//! This library provides functionality to:
//! - Detect the field delimiter of each input file
//! - Parse inputs into tables, tolerating BOMs, Latin-1 and irregular rows
//! - Compute the first-seen-order union of all headers
//! - Merge rows onto that union with a provenance column naming their source
//! - Write the result atomically as comma-delimited UTF-8

pub mod detect;
pub mod error;
pub mod merger;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod writer;

pub use detect::{detect_delimiter, Delimiter};
pub use error::{Error, Result};
pub use merger::{merge_tables, MergeOptions, MergedDataset, DEFAULT_PROVENANCE_COLUMN};
pub use parser::{parse_csv, parse_csv_str, ReadOptions, RowPolicy};
pub use pipeline::{build_dataset, read_inputs, unify, SourceReport, UnifyConfig, UnifyReport};
pub use schema::{unify_columns, with_leading_columns};
pub use table::{short_name, ColumnSchema, InputFile, Row, Table, DEFAULT_SUFFIX};
pub use writer::{write_dataset, write_to};
