//! Merge engine for combining tables onto their column union

use crate::error::{Error, Result};
use crate::schema::{unify_columns, with_leading_columns};
use crate::table::{ColumnSchema, InputFile, Row, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the column holding each row's source short name
pub const DEFAULT_PROVENANCE_COLUMN: &str = "organograma";

/// Options controlling how tables are merged
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Provenance column name, or `None` to leave it out
    pub provenance: Option<String>,
    /// Columns moved to the front of the output, when present
    pub leading_columns: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            provenance: Some(DEFAULT_PROVENANCE_COLUMN.to_string()),
            leading_columns: Vec::new(),
        }
    }
}

/// The merged rows of all inputs, each aligned to `columns`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedDataset {
    /// Output columns: the column union, then the provenance column if any
    pub columns: ColumnSchema,
    /// Rows in input order, then original row order
    pub rows: Vec<Row>,
    /// Files that contributed to this dataset, in merge order
    pub sources: Vec<InputFile>,
    /// Name of the provenance column, when one was added
    pub provenance_column: Option<String>,
}

impl MergedDataset {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look up a cell by row index and column name
    pub fn value(&self, row_idx: usize, column: &str) -> Option<&str> {
        let col_idx = self.columns.position(column)?;
        self.rows.get(row_idx).and_then(|r| r.get(col_idx))
    }
}

/// Merge tables into one dataset over the union of their columns
///
/// Cells for columns a table lacks are empty strings. With provenance
/// enabled, every row also carries its table's short name in the last column.
pub fn merge_tables(tables: &[Table], options: &MergeOptions) -> Result<MergedDataset> {
    let union = unify_columns(tables.iter().map(|t| &t.columns));
    let union = with_leading_columns(union, options.leading_columns.as_slice());

    let mut columns = union.clone();
    if let Some(name) = &options.provenance {
        if !columns.push_unique(name) {
            return Err(Error::ProvenanceCollision {
                column: name.clone(),
            });
        }
    }

    let total: usize = tables.iter().map(Table::row_count).sum();
    let mut rows = Vec::with_capacity(total);

    for table in tables {
        // Position of each union column in this table, if it has it
        let mapping: Vec<Option<usize>> =
            union.iter().map(|name| table.columns.position(name)).collect();

        for row in &table.rows {
            let mut cells: Vec<String> = mapping
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i)).unwrap_or_default().to_string())
                .collect();

            if options.provenance.is_some() {
                cells.push(table.source.short_name.clone());
            }

            rows.push(Row::new(cells));
        }

        debug!(
            path = %table.source.path.display(),
            rows = table.row_count(),
            missing = mapping.iter().filter(|m| m.is_none()).count(),
            "merged table"
        );
    }

    Ok(MergedDataset {
        columns,
        rows,
        sources: tables.iter().map(|t| t.source.clone()).collect(),
        provenance_column: options.provenance.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_csv_str, ReadOptions};
    use crate::table::DEFAULT_SUFFIX;

    fn table(csv: &str, name: &str) -> Table {
        parse_csv_str(csv, InputFile::new(name, DEFAULT_SUFFIX), &ReadOptions::default()).unwrap()
    }

    fn no_provenance() -> MergeOptions {
        MergeOptions {
            provenance: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_single_table() {
        let base = table("id,nome,cpf\n1,Ana,123\n2,Bruno,456\n", "base_agrupado.csv");

        let result = merge_tables(&[base], &no_provenance()).unwrap();

        assert_eq!(result.columns.names(), &["id", "nome", "cpf"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1].cells, vec!["2", "Bruno", "456"]);
    }

    #[test]
    fn test_merge_two_files_with_provenance() {
        let a = table("id,nome\n1,Ana\n", "A_agrupado.csv");
        let b = table("id,setor\n2,RH\n", "B_agrupado.csv");

        let result = merge_tables(&[a, b], &MergeOptions::default()).unwrap();

        assert_eq!(result.columns.names(), &["id", "nome", "setor", "organograma"]);
        assert_eq!(result.rows[0].cells, vec!["1", "Ana", "", "A"]);
        assert_eq!(result.rows[1].cells, vec!["2", "", "RH", "B"]);
        assert_eq!(result.provenance_column.as_deref(), Some("organograma"));
    }

    #[test]
    fn test_rows_are_not_combined_by_id() {
        let base = table("id,nome\n1,Ana\n", "base.csv");
        let overlay = table("id,nome\n1,Outra\n", "overlay.csv");

        let result = merge_tables(&[base, overlay], &no_provenance()).unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.value(0, "nome"), Some("Ana"));
        assert_eq!(result.value(1, "nome"), Some("Outra"));
    }

    #[test]
    fn test_column_order_is_remapped() {
        let a = table("id,nome,cpf\n1,Ana,123\n", "a.csv");
        let b = table("cpf,id\n456,2\n", "b.csv");

        let result = merge_tables(&[a, b], &no_provenance()).unwrap();

        assert_eq!(result.rows[1].cells, vec!["2", "", "456"]);
    }

    #[test]
    fn test_present_empty_value_stays_empty() {
        let a = table("id,nome\n1,\n", "a.csv");

        let result = merge_tables(&[a], &no_provenance()).unwrap();

        assert_eq!(result.value(0, "nome"), Some(""));
    }

    #[test]
    fn test_leading_columns() {
        let a = table("id,total,nome\n1,10,Ana\n", "a.csv");
        let options = MergeOptions {
            leading_columns: vec!["nome".to_string(), "matricula".to_string()],
            ..Default::default()
        };

        let result = merge_tables(&[a], &options).unwrap();

        assert_eq!(result.columns.names(), &["nome", "id", "total", "organograma"]);
        assert_eq!(result.rows[0].cells, vec!["Ana", "1", "10", "a.csv"]);
    }

    #[test]
    fn test_custom_provenance_column() {
        let a = table("id,nome\n1,Ana\n", "1802002_agrupado.csv");
        let options = MergeOptions {
            provenance: Some("origem".to_string()),
            ..Default::default()
        };

        let result = merge_tables(&[a], &options).unwrap();

        assert_eq!(result.value(0, "origem"), Some("1802002"));
    }

    #[test]
    fn test_provenance_collision() {
        let a = table("id,organograma\n1,X\n", "a.csv");

        let err = merge_tables(&[a], &MergeOptions::default()).unwrap_err();

        assert!(matches!(err, Error::ProvenanceCollision { ref column } if column == "organograma"));
    }

    #[test]
    fn test_sources_in_merge_order() {
        let a = table("id,x\n1,2\n", "a.csv");
        let b = table("id,y\n", "b.csv");

        let result = merge_tables(&[a, b], &MergeOptions::default()).unwrap();

        let names: Vec<&str> = result.sources.iter().map(|s| s.short_name.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.columns.names(), &["id", "x", "y", "organograma"]);
    }
}
