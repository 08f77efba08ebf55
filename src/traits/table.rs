//! Tabular trait data read from CSV/TSV files.

use crate::traits::TraitError;
use csv::ReaderBuilder;
use std::fs::File;
use std::io;
use std::path::Path;

/// String table with named columns, e.g. sample metadata keyed by tip name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TraitTable {
    /// Reads a table with header row; files ending in `.tsv` or `.tab` are
    /// tab separated, all others comma separated.
    ///
    /// # Errors
    /// [TraitError::Io] if the file cannot be opened, [TraitError::Csv] if
    /// it is malformed (e.g. rows of unequal length).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TraitError> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("tab") => b'\t',
            _ => b',',
        };
        let file = File::open(path).map_err(|source| TraitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader_with_delimiter(file, delimiter)
    }

    /// Reads a comma separated table with header row.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, TraitError> {
        Self::from_reader_with_delimiter(reader, b',')
    }

    pub fn from_reader_with_delimiter<R: io::Read>(reader: R, delimiter: u8) -> Result<Self, TraitError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let columns = csv_reader.headers()?.iter().map(|s| s.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of `column`.
    ///
    /// # Errors
    /// [TraitError::UnknownColumn] if there is no such column.
    pub fn column_index(&self, column: &str) -> Result<usize, TraitError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| TraitError::UnknownColumn(column.to_string()))
    }

    /// Indices of the rows whose `column` equals `value`.
    pub fn rows_matching(&self, column: &str, value: &str) -> Result<Vec<usize>, TraitError> {
        let col = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col] == value)
            .map(|(i, _)| i)
            .collect())
    }

    /// Cell at `row` in `column`, `None` if `row` is out of range.
    pub fn value(&self, row: usize, column: &str) -> Result<Option<&str>, TraitError> {
        let col = self.column_index(column)?;
        Ok(self.rows.get(row).map(|r| r[col].as_str()))
    }

    /// All cells of `column`, in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&str>, TraitError> {
        let col = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| r[col].as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "strain,region,host\nKea_2020-01-01,Otago,bird\nKaka_2020-03-01,Nelson,bird\nKea_2020-01-01,Canterbury,bird\n";

    #[test]
    fn test_lookup() {
        let table = TraitTable::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["strain", "region", "host"]);
        assert_eq!(table.num_rows(), 3);

        assert_eq!(table.rows_matching("strain", "Kea_2020-01-01").unwrap(), vec![0, 2]);
        assert_eq!(table.value(1, "region").unwrap(), Some("Nelson"));
        assert_eq!(table.value(7, "region").unwrap(), None);
        assert_eq!(table.column_values("host").unwrap(), vec!["bird"; 3]);
    }

    #[test]
    fn test_unknown_column() {
        let table = TraitTable::from_reader(TABLE.as_bytes()).unwrap();
        let err = table.rows_matching("country", "NZ").unwrap_err();
        assert!(matches!(err, TraitError::UnknownColumn(c) if c == "country"));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = TraitTable::from_reader("a,b\n1,2,3\n".as_bytes());
        assert!(matches!(result, Err(TraitError::Csv(_))));
    }

    #[test]
    fn test_tab_separated() {
        let table = TraitTable::from_reader_with_delimiter("name\tclade\nA\t1\n".as_bytes(), b'\t').unwrap();
        assert_eq!(table.value(0, "clade").unwrap(), Some("1"));
    }
}
