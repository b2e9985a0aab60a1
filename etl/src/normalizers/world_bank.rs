use common::Result;
use std::collections::HashSet;
use std::path::Path;

use super::columns::{TableBuilder, parse_number, parse_year};
use super::{Normalized, SourceNormalizer};
use crate::raw::{HeaderLocator, RawTable, non_empty};

const SOURCE_NAME: &str = "world_bank";
const SHEET_NAME: &str = "Data";
const SHEET_SKIP_ROWS: usize = 3;
const COUNTRY_NAME: &str = "Country Name";
const COUNTRY_CODE: &str = "Country Code";
const VALUE_COLUMN: &str = "part_renouvelable_hors_hydro_pct";

/// Annual indicator published as a wide table, one column per year.
pub struct WorldBankNormalizer;

struct LongRow<'a> {
    country: &'a str,
    code: &'a str,
    year: i32,
    value: Option<f64>,
}

impl SourceNormalizer for WorldBankNormalizer {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn partition_keys(&self) -> &'static [&'static str] {
        &["annee"]
    }

    fn quality_key(&self) -> &'static [&'static str] {
        &[COUNTRY_NAME, COUNTRY_CODE]
    }

    /// Spreadsheet exports carry a three-row preamble above the header; CSV
    /// exports are located by their header label instead.
    fn load(&self, path: &Path) -> Result<RawTable> {
        let is_delimited = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        if is_delimited {
            RawTable::read_delimited_path(path, b',', HeaderLocator::FirstCellEquals(COUNTRY_NAME))
        } else {
            RawTable::read_workbook(path, SHEET_NAME, HeaderLocator::SkipRows(SHEET_SKIP_ROWS))
        }
    }

    fn normalize(&self, raw: &RawTable) -> Result<Normalized> {
        let required = raw.require_columns(SOURCE_NAME, &[COUNTRY_NAME, COUNTRY_CODE])?;
        let (name_idx, code_idx) = (required[0], required[1]);

        let rows: Vec<&[String]> = raw.rows().collect();
        let mut seen = HashSet::new();
        let mut long_rows = Vec::new();

        // Melt column by column; headers that are not years are dropped.
        for (col_idx, header) in raw.headers().iter().enumerate() {
            if col_idx == name_idx || col_idx == code_idx {
                continue;
            }
            let Some(year) = parse_year(header) else {
                continue;
            };

            for row in &rows {
                let country = row[name_idx].as_str();
                if !seen.insert((country, year)) {
                    continue;
                }
                long_rows.push(LongRow {
                    country,
                    code: row[code_idx].as_str(),
                    year,
                    value: parse_number(&row[col_idx]),
                });
            }
        }

        let mut builder = TableBuilder::new();
        builder.text("pays", long_rows.iter().map(|r| non_empty(r.country)));
        builder.text("code_pays", long_rows.iter().map(|r| non_empty(r.code)));
        builder.int32("annee", long_rows.iter().map(|r| Some(r.year)).collect());
        builder.float64(VALUE_COLUMN, long_rows.iter().map(|r| r.value).collect());

        Ok(self.report(raw, builder.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, StringArray};
    use common::Error;

    fn wide_table(countries: &[(&str, &str)], first_year: i32, last_year: i32) -> RawTable {
        let mut headers = vec![
            COUNTRY_NAME.to_string(),
            COUNTRY_CODE.to_string(),
            "Indicator Name".to_string(),
            "Indicator Code".to_string(),
        ];
        headers.extend((first_year..=last_year).map(|y| y.to_string()));

        let rows = countries
            .iter()
            .map(|(name, code)| {
                let mut row = vec![
                    name.to_string(),
                    code.to_string(),
                    "Renewable electricity output".to_string(),
                    "EG.ELC.RNWX.ZS".to_string(),
                ];
                row.extend((first_year..=last_year).map(|y| format!("{}.5", y - first_year)));
                row
            })
            .collect();

        RawTable::new(headers, rows)
    }

    #[test]
    fn reshapes_wide_years_into_long_rows() {
        let raw = wide_table(&[("France", "FRA"), ("Germany", "DEU")], 1990, 2020);
        let normalized = WorldBankNormalizer.normalize(&raw).unwrap();
        let batch = &normalized.batch;

        assert_eq!(batch.num_rows(), 31 * 2);
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["pays", "code_pays", "annee", VALUE_COLUMN]);

        let annee = batch.column(2).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(annee.value(0), 1990);
        assert_eq!(annee.value(batch.num_rows() - 1), 2020);

        let pays = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let france_rows = pays.iter().filter(|p| *p == Some("France")).count();
        assert_eq!(france_rows, 31);
    }

    #[test]
    fn missing_values_stay_as_nulls() {
        let raw = RawTable::new(
            vec![COUNTRY_NAME.into(), COUNTRY_CODE.into(), "2000".into(), "2001".into()],
            vec![vec!["France".into(), "FRA".into(), "".into(), "12.25".into()]],
        );
        let normalized = WorldBankNormalizer.normalize(&raw).unwrap();
        let values = normalized
            .batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();

        assert_eq!(normalized.batch.num_rows(), 2);
        assert!(values.is_null(0));
        assert_eq!(values.value(1), 12.25);
    }

    #[test]
    fn duplicate_country_year_keeps_first() {
        let raw = RawTable::new(
            vec![COUNTRY_NAME.into(), COUNTRY_CODE.into(), "2000".into()],
            vec![
                vec!["France".into(), "FRA".into(), "1".into()],
                vec!["France".into(), "FR2".into(), "2".into()],
            ],
        );
        let normalized = WorldBankNormalizer.normalize(&raw).unwrap();
        let codes = normalized
            .batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();

        assert_eq!(normalized.batch.num_rows(), 1);
        assert_eq!(codes.value(0), "FRA");
    }

    #[test]
    fn missing_country_columns_is_structural() {
        let raw = RawTable::new(vec!["Pays".into(), "2000".into()], vec![]);
        let err = WorldBankNormalizer.normalize(&raw).unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }

    #[test]
    fn loads_csv_export_with_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world_bank_renewable.csv");
        std::fs::write(
            &path,
            "\"Data Source\",\"World Development Indicators\",\n\n\
             \"Last Updated Date\",\"2024-06-28\",\n\n\
             \"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2019\",\"2020\",\n\
             \"France\",\"FRA\",\"Renewable\",\"EG.ELC.RNWX.ZS\",\"10.1\",\"11.2\",\n",
        )
        .unwrap();

        let raw = WorldBankNormalizer.load(&path).unwrap();
        let normalized = WorldBankNormalizer.normalize(&raw).unwrap();
        assert_eq!(normalized.batch.num_rows(), 2);
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WorldBankNormalizer.load(&dir.path().join("absent.xls")).is_err());
    }
}
