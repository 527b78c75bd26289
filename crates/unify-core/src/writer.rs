//! Writer for the merged output file

use crate::error::{Error, Result};
use crate::merger::MergedDataset;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Serialize a dataset as comma-delimited UTF-8 text
///
/// Fields containing a comma, a quote or a line break are quoted and embedded
/// quotes are doubled. Records end with CRLF.
pub fn write_to<W: Write>(dataset: &MergedDataset, out: W) -> io::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);

    writer.write_record(dataset.columns.iter())?;
    for row in &dataset.rows {
        writer.write_record(&row.cells)?;
    }
    writer.flush()
}

/// Write a dataset to `path`, replacing any existing file
///
/// Rows go to a temporary file next to `path` that is renamed into place
/// once complete, so a failed run never leaves a partial output behind.
/// Parent directories are not created.
pub fn write_dataset(dataset: &MergedDataset, path: &Path) -> Result<()> {
    let io_err = |source: io::Error| Error::IoWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write_to(dataset, &mut out).map_err(io_err)?;
        out.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;

    // Temporary files are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644)).map_err(io_err)?;
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;

    debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "wrote output"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnSchema, Row};

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> MergedDataset {
        MergedDataset {
            columns: columns.iter().collect::<ColumnSchema>(),
            rows: rows
                .iter()
                .map(|r| Row::new(r.iter().map(|c| c.to_string()).collect()))
                .collect(),
            sources: Vec::new(),
            provenance_column: None,
        }
    }

    fn render(dataset: &MergedDataset) -> String {
        let mut buf = Vec::new();
        write_to(dataset, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_header_and_rows() {
        let data = dataset(&["id", "nome", "setor"], &[&["1", "Ana", ""], &["2", "", "RH"]]);
        assert_eq!(render(&data), "id,nome,setor\r\n1,Ana,\r\n2,,RH\r\n");
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let data = dataset(
            &["id", "obs"],
            &[&["1", "Silva, Ana"], &["2", "diz \"oi\""], &["3", "a\nb"], &["4", "a;b"]],
        );
        assert_eq!(
            render(&data),
            "id,obs\r\n1,\"Silva, Ana\"\r\n2,\"diz \"\"oi\"\"\"\r\n3,\"a\nb\"\r\n4,a;b\r\n"
        );
    }

    #[test]
    fn test_write_has_no_bom() {
        let data = dataset(&["seção"], &[&["ç"]]);
        let text = render(&data);
        assert!(text.starts_with("seção"));
    }

    #[test]
    fn test_write_dataset_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        let data = dataset(&["id"], &[&["1"]]);

        write_dataset(&data, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "id\r\n1\r\n");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_dataset_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        fs::write(&path, "old contents\n").unwrap();

        write_dataset(&dataset(&["id"], &[]), &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "id\r\n");
    }

    #[test]
    fn test_write_dataset_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("merged.csv");

        let err = write_dataset(&dataset(&["id"], &[]), &path).unwrap_err();

        assert!(matches!(err, Error::IoWrite { .. }));
        assert!(err.to_string().contains("merged.csv"));
        assert!(!path.exists());
    }
}
