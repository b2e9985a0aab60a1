use chrono::{Datelike, NaiveDateTime};
use common::Result;
use std::collections::HashSet;
use std::path::Path;

use super::columns::{TableBuilder, parse_date_time, parse_number, timestamp_nanos};
use super::{Normalized, SourceNormalizer};
use crate::raw::{HeaderLocator, RawTable, non_empty};

const SOURCE_NAME: &str = "stock_prices";
const DATE_COLUMN: &str = "date";
const TICKER_COLUMN: &str = "symbole_action";

const RENAMES: [(&str, &str); 6] = [
    ("Date", "date"),
    ("Open", "ouverture"),
    ("High", "max_jour"),
    ("Low", "min_jour"),
    ("Close", "cloture"),
    ("Volume", "volume"),
];

const NUMERIC_COLUMNS: [&str; 5] = ["ouverture", "max_jour", "min_jour", "cloture", "volume"];

fn canonical_name(header: &str) -> &str {
    RENAMES
        .iter()
        .find(|(raw, _)| *raw == header)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(header)
}

/// Daily OHLCV quotes, one row per (date, ticker).
pub struct StockPricesNormalizer;

impl SourceNormalizer for StockPricesNormalizer {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn partition_keys(&self) -> &'static [&'static str] {
        &["symbole_action", "annee"]
    }

    fn quality_key(&self) -> &'static [&'static str] {
        &["Date", "symbole_action"]
    }

    fn load(&self, path: &Path) -> Result<RawTable> {
        RawTable::read_delimited_path(path, b',', HeaderLocator::FirstRow)
    }

    fn normalize(&self, raw: &RawTable) -> Result<Normalized> {
        let headers: Vec<&str> = raw.headers().iter().map(|h| canonical_name(h)).collect();
        let renamed = RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            Vec::new(),
        );
        let required = renamed.require_columns(SOURCE_NAME, &[DATE_COLUMN, TICKER_COLUMN])?;
        let (date_idx, ticker_idx) = (required[0], required[1]);

        let mut seen = HashSet::new();
        let kept: Vec<(&[String], NaiveDateTime)> = raw
            .rows()
            .filter_map(|row| {
                let date = parse_date_time(&row[date_idx])?;
                timestamp_nanos(&date)?;
                let ticker = non_empty(&row[ticker_idx])?;
                seen.insert((date, ticker)).then_some((row, date))
            })
            .collect();

        let mut builder = TableBuilder::new();
        for (idx, name) in headers.iter().enumerate() {
            if idx == date_idx {
                builder.timestamp(
                    name,
                    kept.iter().map(|(_, date)| timestamp_nanos(date)).collect(),
                );
            } else if NUMERIC_COLUMNS.contains(name) {
                builder.float64(
                    name,
                    kept.iter().map(|(row, _)| parse_number(&row[idx])).collect(),
                );
            } else {
                builder.text(name, kept.iter().map(|(row, _)| non_empty(&row[idx])));
            }
        }
        builder.int32("annee", kept.iter().map(|(_, date)| Some(date.year())).collect());

        Ok(self.report(raw, builder.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, StringArray, TimestampNanosecondArray};
    use common::Error;

    fn raw(data: &str) -> RawTable {
        RawTable::read_delimited(data.as_bytes(), b',', HeaderLocator::FirstRow).unwrap()
    }

    fn column<'a, T: 'static>(batch: &'a arrow::record_batch::RecordBatch, name: &str) -> &'a T {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<T>()
            .unwrap()
    }

    #[test]
    fn duplicate_date_and_ticker_keeps_first_close() {
        let raw = raw("Date,Open,High,Low,Close,Volume,symbole_action,nom_entreprise\n\
                       2023-01-01,10,12,9,11.5,1000,FSLR,First Solar\n\
                       2023-01-01,10,12,9,99.0,1000,FSLR,First Solar\n");
        let normalized = StockPricesNormalizer.normalize(&raw).unwrap();

        assert_eq!(normalized.batch.num_rows(), 1);
        assert_eq!(column::<Float64Array>(&normalized.batch, "cloture").value(0), 11.5);
        assert_eq!(normalized.report.duplicates_before, Some(1));
    }

    #[test]
    fn renames_and_derives_year() {
        let raw = raw("Date,Open,High,Low,Close,Volume,symbole_action\n\
                       2022-12-30 00:00:00-05:00,1,2,0.5,1.5,300,ENPH\n\
                       2023-01-03,1,2,0.5,n/a,300,ENPH\n");
        let normalized = StockPricesNormalizer.normalize(&raw).unwrap();
        let batch = &normalized.batch;

        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec!["date", "ouverture", "max_jour", "min_jour", "cloture", "volume", "symbole_action", "annee"]
        );

        let annee = column::<Int32Array>(batch, "annee");
        assert_eq!((annee.value(0), annee.value(1)), (2022, 2023));
        assert!(column::<Float64Array>(batch, "cloture").is_null(1));
        assert_eq!(column::<TimestampNanosecondArray>(batch, "date").null_count(), 0);
    }

    #[test]
    fn rows_missing_date_or_ticker_are_dropped() {
        let raw = raw("Date,Close,symbole_action\n\
                       ,1,FSLR\n\
                       garbage,1,FSLR\n\
                       2023-01-02,1,\n\
                       2023-01-02,2,FSLR\n");
        let normalized = StockPricesNormalizer.normalize(&raw).unwrap();

        assert_eq!(normalized.batch.num_rows(), 1);
        assert_eq!(column::<StringArray>(&normalized.batch, "symbole_action").value(0), "FSLR");
        assert_eq!(normalized.report.rows_removed(), 3);
    }

    #[test]
    fn missing_ticker_column_is_structural() {
        let raw = raw("Date,Close\n2023-01-02,1\n");
        let err = StockPricesNormalizer.normalize(&raw).unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }
}
