//! End-to-end merge run: read, unify, merge, write
//!
//! A run is all-or-nothing. Every input is checked before any is parsed,
//! and the output only appears once all rows were written.

use crate::detect::Delimiter;
use crate::error::{Error, Result};
use crate::merger::{merge_tables, MergeOptions, MergedDataset, DEFAULT_PROVENANCE_COLUMN};
use crate::parser::{parse_csv, ReadOptions, RowPolicy};
use crate::table::{InputFile, Table, DEFAULT_SUFFIX};
use crate::writer::write_dataset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs merged when none are given
pub const DEFAULT_INPUTS: [&str; 3] = [
    "1802002_agrupado.csv",
    "11802004_agrupado.csv",
    "11802005_agrupado.csv",
];

/// Output written when none is given
pub const DEFAULT_OUTPUT: &str = "merged_agrupado.csv";

/// Everything a merge run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifyConfig {
    /// Input files, in merge order
    pub inputs: Vec<PathBuf>,
    /// Output file
    pub output: PathBuf,
    /// Suffix stripped from input file names to get their short name
    pub suffix: String,
    /// Provenance column name, or `None` to leave it out
    pub provenance: Option<String>,
    /// Delimiter forced on every input instead of detecting one
    pub delimiter: Option<Delimiter>,
    /// Field-count mismatch handling
    pub row_policy: RowPolicy,
    /// Columns moved to the front of the output, when present
    pub leading_columns: Vec<String>,
    /// Create missing parent directories of `output` once the inputs are read
    pub create_dirs: bool,
}

impl Default for UnifyConfig {
    fn default() -> Self {
        Self {
            inputs: DEFAULT_INPUTS.iter().map(PathBuf::from).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            suffix: DEFAULT_SUFFIX.to_string(),
            provenance: Some(DEFAULT_PROVENANCE_COLUMN.to_string()),
            delimiter: None,
            row_policy: RowPolicy::default(),
            leading_columns: Vec::new(),
            create_dirs: false,
        }
    }
}

impl UnifyConfig {
    /// Options passed to the reader for every input
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            delimiter: self.delimiter,
            row_policy: self.row_policy,
        }
    }

    /// Options passed to the merger
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            provenance: self.provenance.clone(),
            leading_columns: self.leading_columns.clone(),
        }
    }
}

/// Summary of one input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub path: PathBuf,
    pub short_name: String,
    pub delimiter: Delimiter,
    pub encoding: String,
    pub columns: usize,
    pub rows: usize,
}

impl From<&Table> for SourceReport {
    fn from(table: &Table) -> Self {
        Self {
            path: table.source.path.clone(),
            short_name: table.source.short_name.clone(),
            delimiter: table.delimiter,
            encoding: table.encoding.clone(),
            columns: table.column_count(),
            rows: table.row_count(),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifyReport {
    /// Where the merged file was written
    pub output: PathBuf,
    /// Output header, provenance column included
    pub columns: Vec<String>,
    /// Number of data rows written
    pub rows: usize,
    /// Inputs in merge order
    pub sources: Vec<SourceReport>,
}

impl UnifyReport {
    /// Save the report as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content).map_err(|e| Error::IoWrite {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

/// Read every input of `config`, in order
///
/// All paths are checked up front so a missing last file is reported before
/// any parsing work is done.
pub fn read_inputs(config: &UnifyConfig) -> Result<Vec<Table>> {
    if config.inputs.is_empty() {
        return Err(Error::NoInputs);
    }

    if let Some(missing) = config.inputs.iter().find(|p| !p.is_file()) {
        return Err(Error::InputNotFound {
            path: missing.clone(),
        });
    }

    let options = config.read_options();
    config
        .inputs
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "reading input");
            parse_csv(InputFile::new(path, &config.suffix), &options)
        })
        .collect()
}

/// Read and merge the inputs of `config` without writing anything
pub fn build_dataset(config: &UnifyConfig) -> Result<(Vec<Table>, MergedDataset)> {
    let tables = read_inputs(config)?;
    let merged = merge_tables(&tables, &config.merge_options())?;
    Ok((tables, merged))
}

/// Run a full merge and write the output file
pub fn unify(config: &UnifyConfig) -> Result<UnifyReport> {
    let (tables, merged) = build_dataset(config)?;

    if config.create_dirs {
        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: config.output.clone(),
                source: e,
            })?;
        }
    }
    write_dataset(&merged, &config.output)?;

    info!(
        inputs = tables.len(),
        rows = merged.row_count(),
        columns = merged.column_count(),
        output = %config.output.display(),
        "merge complete"
    );

    Ok(UnifyReport {
        output: config.output.clone(),
        columns: merged.columns.names().to_vec(),
        rows: merged.row_count(),
        sources: tables.iter().map(SourceReport::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UnifyConfig::default();

        assert_eq!(config.inputs.len(), 3);
        assert_eq!(config.output, PathBuf::from("merged_agrupado.csv"));
        assert_eq!(config.provenance.as_deref(), Some("organograma"));
        assert_eq!(config.row_policy, RowPolicy::Lenient);
    }

    #[test]
    fn test_no_inputs() {
        let config = UnifyConfig {
            inputs: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(unify(&config), Err(Error::NoInputs)));
    }

    #[test]
    fn test_missing_input_is_reported_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "no delimiter here\n").unwrap();
        let missing = dir.path().join("missing_agrupado.csv");

        let config = UnifyConfig {
            inputs: vec![bad, missing.clone()],
            output: dir.path().join("out.csv"),
            ..Default::default()
        };

        match unify(&config) {
            Err(Error::InputNotFound { path }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!config.output.exists());
    }

    #[test]
    fn test_create_dirs_waits_for_valid_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out").join("nested");
        let config = UnifyConfig {
            inputs: vec![dir.path().join("missing_agrupado.csv")],
            output: out_dir.join("merged.csv"),
            create_dirs: true,
            ..Default::default()
        };

        assert!(matches!(unify(&config), Err(Error::InputNotFound { .. })));
        assert!(!dir.path().join("out").exists());

        let input = dir.path().join("a_agrupado.csv");
        fs::write(&input, "id,nome\n1,Ana\n").unwrap();
        let config = UnifyConfig {
            inputs: vec![input],
            ..config
        };

        unify(&config).unwrap();
        assert!(config.output.is_file());
    }

    #[test]
    fn test_directory_is_not_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = UnifyConfig {
            inputs: vec![dir.path().to_path_buf()],
            output: dir.path().join("out.csv"),
            ..Default::default()
        };

        assert!(matches!(unify(&config), Err(Error::InputNotFound { .. })));
    }
}
