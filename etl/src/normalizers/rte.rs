use chrono::{Datelike, NaiveDateTime};
use common::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use super::columns::{TableBuilder, parse_number, parse_with_format, timestamp_nanos};
use super::{Normalized, SourceNormalizer};
use crate::raw::{HeaderLocator, RawTable, non_empty};

const SOURCE_NAME: &str = "rte";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// Power measurements are named with their unit, e.g. "Solaire (MW)".
static POWER_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(MW\)").expect("Invalid power column regex"));

/// Time-series production data (eCO2mix national export).
pub struct RteNormalizer;

impl SourceNormalizer for RteNormalizer {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn partition_keys(&self) -> &'static [&'static str] {
        &["annee", "mois"]
    }

    fn quality_key(&self) -> &'static [&'static str] {
        &["Date", "Heure"]
    }

    fn load(&self, path: &Path) -> Result<RawTable> {
        RawTable::read_delimited_path(path, b';', HeaderLocator::FirstRow)
    }

    fn normalize(&self, raw: &RawTable) -> Result<Normalized> {
        let required = raw.require_columns(SOURCE_NAME, &["Date", "Heure"])?;
        let (date_idx, time_idx) = (required[0], required[1]);

        // Unparseable timestamps drop the row; the first row per timestamp wins.
        let mut seen = HashSet::new();
        let kept: Vec<(&[String], NaiveDateTime)> = raw
            .rows()
            .filter_map(|row| {
                let ts = parse_with_format(&row[date_idx], &row[time_idx], TIMESTAMP_FORMAT)?;
                timestamp_nanos(&ts)?;
                seen.insert(ts).then_some((row, ts))
            })
            .collect();

        let mut builder = TableBuilder::new();
        for (idx, header) in raw.headers().iter().enumerate() {
            if POWER_COLUMN.is_match(header) {
                builder.float64(
                    header,
                    kept.iter().map(|(row, _)| parse_number(&row[idx])).collect(),
                );
            } else {
                builder.text(header, kept.iter().map(|(row, _)| non_empty(&row[idx])));
            }
        }

        builder.timestamp(
            "event_datetime",
            kept.iter().map(|(_, ts)| timestamp_nanos(ts)).collect(),
        );
        builder.int32("annee", kept.iter().map(|(_, ts)| Some(ts.year())).collect());
        builder.int32("mois", kept.iter().map(|(_, ts)| Some(ts.month() as i32)).collect());
        builder.int32("jour", kept.iter().map(|(_, ts)| Some(ts.day() as i32)).collect());

        Ok(self.report(raw, builder.finish()?))
    }
}
