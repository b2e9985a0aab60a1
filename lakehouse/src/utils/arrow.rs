use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, LargeStringArray, StringArray,
    StringViewArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array,
    UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::{DateTime, NaiveDateTime};
use common::{Error, Result};
use serde_json::{Map, Number, Value};

/// Converts record batches into JSON objects, one per row, keeping the
/// column order of the batch schema. Missing values become `null`.
pub fn batches_to_json(batches: &[RecordBatch]) -> Result<Vec<Value>> {
    let mut json_rows = Vec::new();

    for batch in batches {
        let schema = batch.schema();
        for row_idx in 0..batch.num_rows() {
            let mut row = Map::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = arrow_array_to_json(batch.column(col_idx).as_ref(), row_idx)?;
                row.insert(field.name().clone(), value);
            }
            json_rows.push(Value::Object(row));
        }
    }

    Ok(json_rows)
}

fn downcast<'a, T: 'static>(array: &'a dyn Array) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Other(format!(
            "column of type {} could not be read",
            array.data_type()
        ))
    })
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn naive_to_json(datetime: Option<NaiveDateTime>) -> Value {
    datetime.map_or(Value::Null, |dt| {
        Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    })
}

pub fn arrow_array_to_json(array: &dyn Array, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    Ok(match array.data_type() {
        DataType::Boolean => Value::Bool(downcast::<BooleanArray>(array)?.value(index)),
        DataType::Int8 => Value::from(downcast::<Int8Array>(array)?.value(index)),
        DataType::Int16 => Value::from(downcast::<Int16Array>(array)?.value(index)),
        DataType::Int32 => Value::from(downcast::<Int32Array>(array)?.value(index)),
        DataType::Int64 => Value::from(downcast::<Int64Array>(array)?.value(index)),
        DataType::UInt8 => Value::from(downcast::<UInt8Array>(array)?.value(index)),
        DataType::UInt16 => Value::from(downcast::<UInt16Array>(array)?.value(index)),
        DataType::UInt32 => Value::from(downcast::<UInt32Array>(array)?.value(index)),
        DataType::UInt64 => Value::from(downcast::<UInt64Array>(array)?.value(index)),
        DataType::Float32 => float_to_json(downcast::<Float32Array>(array)?.value(index) as f64),
        DataType::Float64 => float_to_json(downcast::<Float64Array>(array)?.value(index)),
        DataType::Utf8 => Value::String(downcast::<StringArray>(array)?.value(index).to_string()),
        DataType::LargeUtf8 => {
            Value::String(downcast::<LargeStringArray>(array)?.value(index).to_string())
        }
        DataType::Utf8View => {
            Value::String(downcast::<StringViewArray>(array)?.value(index).to_string())
        }
        DataType::Date32 => naive_to_json(downcast::<Date32Array>(array)?.value_as_datetime(index)),
        DataType::Date64 => naive_to_json(downcast::<Date64Array>(array)?.value_as_datetime(index)),
        DataType::Timestamp(unit, _) => {
            let nanos = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(array)?
                    .value(index)
                    .checked_mul(1_000_000_000),
                TimeUnit::Millisecond => downcast::<TimestampMillisecondArray>(array)?
                    .value(index)
                    .checked_mul(1_000_000),
                TimeUnit::Microsecond => downcast::<TimestampMicrosecondArray>(array)?
                    .value(index)
                    .checked_mul(1_000),
                TimeUnit::Nanosecond => Some(downcast::<TimestampNanosecondArray>(array)?.value(index)),
            };
            naive_to_json(nanos.map(|n| DateTime::from_timestamp_nanos(n).naive_utc()))
        }
        DataType::Dictionary(_, _) => {
            let dictionary = array.as_any_dictionary();
            let key = dictionary.normalized_keys()[index];
            arrow_array_to_json(dictionary.values().as_ref(), key)?
        }
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array, &options)?;
            Value::String(formatter.value(index).to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, DictionaryArray};
    use arrow::datatypes::{Field, Int32Type, Schema};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn nulls_and_nan_become_json_null() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("pays", DataType::Utf8, true),
            Field::new("valeur", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("France"), None])) as ArrayRef,
                Arc::new(Float64Array::from(vec![Some(f64::NAN), Some(1.5)])),
            ],
        )
        .unwrap();

        let rows = batches_to_json(&[batch]).unwrap();
        assert_eq!(rows[0], json!({"pays": "France", "valeur": null}));
        assert_eq!(rows[1], json!({"pays": null, "valeur": 1.5}));
    }

    #[test]
    fn timestamps_render_as_iso_strings() {
        let array = TimestampNanosecondArray::from(vec![Some(1_672_531_200_000_000_000)]);
        assert_eq!(
            arrow_array_to_json(&array, 0).unwrap(),
            json!("2023-01-01T00:00:00")
        );
    }

    #[test]
    fn view_and_dictionary_strings_are_text() {
        let view = StringViewArray::from(vec!["FSLR"]);
        assert_eq!(arrow_array_to_json(&view, 0).unwrap(), json!("FSLR"));

        let dictionary: DictionaryArray<Int32Type> = vec!["2020", "2021", "2020"].into_iter().collect();
        assert_eq!(arrow_array_to_json(&dictionary, 2).unwrap(), json!("2020"));
    }

    #[test]
    fn preserves_column_order() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("zeta", DataType::Int32, true),
            Field::new("alpha", DataType::Int32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1])) as ArrayRef,
                Arc::new(Int32Array::from(vec![2])),
            ],
        )
        .unwrap();

        let rows = batches_to_json(&[batch]).unwrap();
        let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
