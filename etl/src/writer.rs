//! Schema-conforming, Hive-partitioned Parquet writer.

use arrow::array::{Array, ArrayRef, UInt32Array, new_null_array};
use arrow::compute::{CastOptions, cast_with_options, take_record_batch};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use common::layout::PartitionPath;
use common::schema::{SchemaDeclaration, schema_for};
use common::{Error, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SOURCE_METADATA_KEY: &str = "lakehouse.source";
pub const PARTITION_METADATA_KEY: &str = "lakehouse.partition";

/// A declared type that could not be applied to one column.
#[derive(Debug, Clone, Serialize)]
pub struct CastWarning {
    pub column: String,
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// All cast failures of one write, reported together.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CastReport {
    pub source_name: String,
    pub warnings: Vec<CastWarning>,
}

impl CastReport {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn emit(&self) {
        if self.is_empty() {
            return;
        }
        let columns: Vec<&str> = self.warnings.iter().map(|w| w.column.as_str()).collect();
        warn!(
            source = %self.source_name,
            columns = ?columns,
            "Declared types could not be fully applied, writing with best-effort types"
        );
        for warning in &self.warnings {
            debug!(
                source = %self.source_name,
                column = %warning.column,
                from = %warning.from,
                to = %warning.to,
                reason = %warning.reason,
                "Cast failed"
            );
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    pub source_name: String,
    pub rows_written: usize,
    pub partitions_written: usize,
    pub cast_warnings: usize,
}

/// Reorders a table to the declared columns, null-filling missing ones and
/// dropping undeclared ones, then casts each column to its declared type.
///
/// A failed cast leaves that column with its original type and is recorded
/// in the returned report; it never rejects the table.
pub fn conform_to_schema(
    batch: &RecordBatch,
    declaration: &SchemaDeclaration,
) -> Result<(RecordBatch, CastReport)> {
    let num_rows = batch.num_rows();
    let cast_options = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut report = CastReport {
        source_name: declaration.source_name.to_string(),
        warnings: Vec::new(),
    };
    let mut fields = Vec::with_capacity(declaration.columns.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(declaration.columns.len());

    for decl in &declaration.columns {
        let target = decl.semantic_type.data_type();

        let column = match batch.column_by_name(decl.name) {
            None => new_null_array(&target, num_rows),
            Some(existing) if existing.data_type() == &target => existing.clone(),
            Some(existing) => match cast_with_options(existing, &target, &cast_options) {
                Ok(cast) => cast,
                Err(e) => {
                    report.warnings.push(CastWarning {
                        column: decl.name.to_string(),
                        from: existing.data_type().to_string(),
                        to: target.to_string(),
                        reason: e.to_string(),
                    });
                    existing.clone()
                }
            },
        };

        fields.push(Field::new(decl.name, column.data_type().clone(), true));
        columns.push(column);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    let conformed =
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;

    Ok((conformed, report))
}

/// Writes canonical tables under `<root>/<source>/<key>=<value>/...`.
///
/// Each partition present in a write is replaced wholesale; partitions the
/// write does not touch are left as they are.
pub struct PartitionedWriter {
    root: PathBuf,
}

impl PartitionedWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn write(
        &self,
        batch: &RecordBatch,
        source_name: &str,
        partition_keys: &[&str],
    ) -> Result<WriteSummary> {
        let declaration =
            schema_for(source_name).ok_or_else(|| Error::SchemaMissing(source_name.to_string()))?;

        let key_indices = partition_keys
            .iter()
            .map(|key| {
                declaration
                    .columns
                    .iter()
                    .position(|c| c.name == *key)
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "partition key '{}' is not declared for source '{}'",
                            key, source_name
                        ))
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let data_indices: Vec<usize> = (0..declaration.columns.len())
            .filter(|idx| !key_indices.contains(idx))
            .collect();
        if data_indices.is_empty() {
            return Err(Error::InvalidInput(format!(
                "source '{}' has no columns left once partition keys are removed",
                source_name
            )));
        }

        let (conformed, cast_report) = conform_to_schema(batch, declaration)?;
        cast_report.emit();

        let groups = group_by_partition(&conformed, partition_keys, &key_indices)?;

        for (partition, rows) in &groups {
            let indices = UInt32Array::from(rows.clone());
            let slice = take_record_batch(&conformed, &indices)?.project(&data_indices)?;
            self.write_partition(&slice, source_name, partition)?;
        }

        let summary = WriteSummary {
            source_name: source_name.to_string(),
            rows_written: conformed.num_rows(),
            partitions_written: groups.len(),
            cast_warnings: cast_report.warnings.len(),
        };

        info!(
            source = %source_name,
            rows = summary.rows_written,
            partitions = summary.partitions_written,
            root = %self.root.display(),
            "Canonical asset written"
        );

        Ok(summary)
    }

    fn write_partition(
        &self,
        batch: &RecordBatch,
        source_name: &str,
        partition: &PartitionPath,
    ) -> Result<()> {
        let dir = partition.build_dir(&self.root, source_name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        let filename = format!("part-{}.parquet", Uuid::new_v4());
        let path = dir.join(&filename);

        let properties = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_key_value_metadata(Some(vec![
                KeyValue::new(SOURCE_METADATA_KEY.to_string(), source_name.to_string()),
                KeyValue::new(
                    PARTITION_METADATA_KEY.to_string(),
                    partition.build_storage_path(),
                ),
            ]))
            .build();

        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(properties))?;
        writer.write(batch)?;
        writer.close()?;

        debug!(
            source = %source_name,
            path = %path.display(),
            rows = batch.num_rows(),
            "Partition file written"
        );
        Ok(())
    }
}

/// Row indices per partition, in first-seen row order within each partition.
fn group_by_partition(
    batch: &RecordBatch,
    partition_keys: &[&str],
    key_indices: &[usize],
) -> Result<BTreeMap<PartitionPath, Vec<u32>>> {
    let options = FormatOptions::default();
    let key_columns: Vec<&ArrayRef> = key_indices.iter().map(|&idx| batch.column(idx)).collect();
    let formatters = key_columns
        .iter()
        .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<PartitionPath, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut partition = PartitionPath::new();
        for ((key, column), formatter) in partition_keys.iter().zip(&key_columns).zip(&formatters) {
            let value = (!column.is_null(row)).then(|| formatter.value(row).to_string());
            partition = partition.with_segment(key, value.as_deref());
        }
        let row = u32::try_from(row)
            .map_err(|_| Error::InvalidInput("table too large for a single write".to_string()))?;
        groups.entry(partition).or_default().push(row);
    }

    Ok(groups)
}
