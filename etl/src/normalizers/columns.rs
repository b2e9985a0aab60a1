//! Cell-level coercions and an Arrow table builder shared by the normalizers.
//! Coercions never fail: a cell that does not parse becomes `None`.

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray, TimestampNanosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::Result;
use std::sync::Arc;

use crate::raw::non_empty;

pub fn parse_number(cell: &str) -> Option<f64> {
    let s = non_empty(cell)?;
    s.parse::<f64>()
        .ok()
        .or_else(|| s.replace(',', ".").parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Parses a year label such as `1990` or `1990.0`.
pub fn parse_year(cell: &str) -> Option<i32> {
    let s = non_empty(cell)?;
    if let Ok(year) = s.parse::<i32>() {
        return Some(year);
    }
    let value = s.parse::<f64>().ok()?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// Combines separate date and time cells using a fixed format.
pub fn parse_with_format(date: &str, time: &str, format: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}", non_empty(date)?, non_empty(time)?);
    NaiveDateTime::parse_from_str(&combined, format).ok()
}

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Lenient date/datetime parsing. Offsets are dropped and the wall-clock
/// value is kept.
pub fn parse_date_time(cell: &str) -> Option<NaiveDateTime> {
    let s = non_empty(cell)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_local());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn timestamp_nanos(dt: &NaiveDateTime) -> Option<i64> {
    dt.and_utc().timestamp_nanos_opt()
}

/// Accumulates named columns into a `RecordBatch`. All fields are nullable.
#[derive(Default)]
pub struct TableBuilder {
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, data_type: DataType, column: ArrayRef) {
        self.fields.push(Field::new(name, data_type, true));
        self.columns.push(column);
    }

    pub fn text<'a>(&mut self, name: &str, values: impl IntoIterator<Item = Option<&'a str>>) {
        let array: StringArray = values.into_iter().collect();
        self.push(name, DataType::Utf8, Arc::new(array));
    }

    pub fn float64(&mut self, name: &str, values: Vec<Option<f64>>) {
        self.push(name, DataType::Float64, Arc::new(Float64Array::from(values)));
    }

    pub fn int32(&mut self, name: &str, values: Vec<Option<i32>>) {
        self.push(name, DataType::Int32, Arc::new(Int32Array::from(values)));
    }

    pub fn timestamp(&mut self, name: &str, values: Vec<Option<i64>>) {
        self.push(
            name,
            DataType::Timestamp(TimeUnit::Nanosecond, None),
            Arc::new(TimestampNanosecondArray::from(values)),
        );
    }

    pub fn finish(self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(self.fields));
        Ok(RecordBatch::try_new(schema, self.columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn numbers_coerce_to_none_on_garbage() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("3,25"), Some(3.25));
        assert_eq!(parse_number("ND"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn years_accept_integral_floats_only() {
        assert_eq!(parse_year("1990"), Some(1990));
        assert_eq!(parse_year("1990.0"), Some(1990));
        assert_eq!(parse_year("1990.5"), None);
        assert_eq!(parse_year("Indicator Code"), None);
    }

    #[test]
    fn combines_date_and_time() {
        let dt = parse_with_format("2022-03-01", "13:45", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2022, 3, 1));
        assert_eq!((dt.hour(), dt.minute()), (13, 45));

        assert!(parse_with_format("2022-03-01", "", "%Y-%m-%d %H:%M").is_none());
        assert!(parse_with_format("01/03/2022", "13:45", "%Y-%m-%d %H:%M").is_none());
    }

    #[test]
    fn lenient_dates_keep_wall_clock() {
        let plain = parse_date_time("2023-01-01").unwrap();
        assert_eq!(plain.to_string(), "2023-01-01 00:00:00");

        let with_offset = parse_date_time("2023-01-03 00:00:00-05:00").unwrap();
        assert_eq!(with_offset.to_string(), "2023-01-03 00:00:00");

        assert!(parse_date_time("not a date").is_none());
    }

    #[test]
    fn builder_produces_nullable_columns() {
        let mut builder = TableBuilder::new();
        builder.text("pays", vec![Some("France"), None]);
        builder.int32("annee", vec![Some(1990), Some(1991)]);
        let batch = builder.finish().unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);
        assert!(batch.schema().fields().iter().all(|f| f.is_nullable()));
        assert_eq!(batch.column(0).null_count(), 1);
    }
}
