//! Raw extracts as produced by the acquisition layer, kept as text cells.

use calamine::{Data, Reader, open_workbook_auto};
use common::{Error, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// How to find the header row of a raw extract.
#[derive(Debug, Clone, Copy)]
pub enum HeaderLocator<'a> {
    FirstRow,
    /// Skip this many leading rows; the next one is the header.
    SkipRows(usize),
    /// The header is the first row whose first cell equals this label.
    FirstCellEquals(&'a str),
}

impl HeaderLocator<'_> {
    fn locate(&self, rows: &[Vec<String>]) -> Option<usize> {
        match self {
            HeaderLocator::FirstRow => (!rows.is_empty()).then_some(0),
            HeaderLocator::SkipRows(n) => (*n < rows.len()).then_some(*n),
            HeaderLocator::FirstCellEquals(label) => rows
                .iter()
                .position(|row| row.first().map(|c| c.as_str()) == Some(*label)),
        }
    }
}

/// Tabular raw data. Empty cells stand for missing values.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table, padding or truncating ragged rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn read_delimited<R: Read>(
        reader: R,
        delimiter: u8,
        locator: HeaderLocator<'_>,
    ) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            records.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        }

        Self::from_rows(records, locator)
    }

    pub fn read_delimited_path(
        path: &Path,
        delimiter: u8,
        locator: HeaderLocator<'_>,
    ) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_delimited(file, delimiter, locator)
    }

    /// Reads one sheet of a spreadsheet (xls, xlsx, xlsb or ods).
    pub fn read_workbook(path: &Path, sheet: &str, locator: HeaderLocator<'_>) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Error::Workbook(format!("{}: {}", path.display(), e)))?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(Error::Workbook(format!(
                "sheet '{}' not found in {}",
                sheet,
                path.display()
            )));
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| Error::Workbook(format!("{}: {}", path.display(), e)))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Self::from_rows(rows, locator)
    }

    fn from_rows(mut rows: Vec<Vec<String>>, locator: HeaderLocator<'_>) -> Result<Self> {
        let header_idx = locator
            .locate(&rows)
            .ok_or_else(|| Error::InvalidInput(format!("no header row found ({:?})", locator)))?;

        let data = rows.split_off(header_idx + 1);
        let headers = rows
            .pop()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Self::new(headers, data))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolves columns a normalizer cannot work without.
    pub fn require_columns(&self, source_name: &str, names: &[&str]) -> Result<Vec<usize>> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.column_index(name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(Error::structural(
                source_name,
                format!("missing required columns: {}", missing.join(", ")),
            ));
        }

        Ok(names.iter().filter_map(|name| self.column_index(name)).collect())
    }

    /// Number of rows repeating the key of an earlier row, or `None` when
    /// a key column is absent.
    pub fn duplicate_count(&self, key_columns: &[&str]) -> Option<usize> {
        let indices: Vec<usize> = key_columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Option<Vec<_>>>()?;

        let mut seen = HashSet::with_capacity(self.rows.len());
        let duplicates = self
            .rows
            .iter()
            .filter(|row| {
                let key: Vec<&str> = indices.iter().map(|&i| row[i].as_str()).collect();
                !seen.insert(key)
            })
            .count();

        Some(duplicates)
    }
}

/// Returns the trimmed cell, or `None` for an empty one.
pub fn non_empty(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn reads_semicolon_delimited_with_ragged_rows() {
        let data = "Date;Heure;Solaire (MW)\n2020-01-01;00:00;12\n2020-01-01;00:30\n";
        let raw = RawTable::read_delimited(data.as_bytes(), b';', HeaderLocator::FirstRow).unwrap();

        assert_eq!(raw.headers(), &["Date", "Heure", "Solaire (MW)"]);
        assert_eq!(raw.len(), 2);
        let second: Vec<&[String]> = raw.rows().collect();
        assert_eq!(second[1][2], "");
    }

    #[test]
    fn locates_header_by_first_cell() {
        let data = "\"Data Source\",\"World Development Indicators\"\n\
                    \"Last Updated Date\",\"2024-01-01\"\n\
                    \"Country Name\",\"Country Code\",\"1990\"\n\
                    \"France\",\"FRA\",\"1.5\"\n";
        let raw = RawTable::read_delimited(
            data.as_bytes(),
            b',',
            HeaderLocator::FirstCellEquals("Country Name"),
        )
        .unwrap();

        assert_eq!(raw.headers(), &["Country Name", "Country Code", "1990"]);
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn skip_rows_past_end_is_an_error() {
        let data = "a,b\n1,2\n";
        let result = RawTable::read_delimited(data.as_bytes(), b',', HeaderLocator::SkipRows(5));
        assert!(result.is_err());
    }

    #[test]
    fn require_columns_reports_structural_error() {
        let raw = table(&["Date", "Solaire (MW)"], &[]);
        let err = raw.require_columns("rte", &["Date", "Heure"]).unwrap_err();
        match err {
            Error::Structural { source_name, message } => {
                assert_eq!(source_name, "rte");
                assert!(message.contains("Heure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn counts_logical_duplicates() {
        let raw = table(
            &["Date", "symbole_action", "Close"],
            &[
                &["2023-01-01", "FSLR", "1"],
                &["2023-01-01", "FSLR", "2"],
                &["2023-01-01", "ENPH", "3"],
                &["2023-01-01", "FSLR", "4"],
            ],
        );
        assert_eq!(raw.duplicate_count(&["Date", "symbole_action"]), Some(2));
        assert_eq!(raw.duplicate_count(&["Date", "ticker"]), None);
    }

    #[test]
    fn whole_floats_render_as_integers() {
        assert_eq!(cell_to_string(&Data::Float(1990.0)), "1990");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
