use common::config::QueryConfig;
use common::layout::{PartitionPath, discover_partitions, source_dir};
use common::schema::{SchemaDeclaration, schema_for};
use common::{Error, Result};
use datafusion::arrow::array::{ArrayRef, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field, FieldRef, Schema};
use datafusion::arrow::record_batch::{RecordBatch, RecordBatchOptions};
use datafusion::dataframe::DataFrame;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::predicate::PredicateBuilder;
use crate::catalog::SourceCatalog;
use crate::utils::arrow::batches_to_json;

/// One read request against a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    pub source_name: String,
    pub limit: usize,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub region: Option<String>,
    pub text: Option<String>,
}

impl FilterRequest {
    pub fn new(source_name: impl Into<String>, limit: usize) -> Self {
        Self {
            source_name: source_name.into(),
            limit,
            year_start: None,
            year_end: None,
            region: None,
            text: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub source: String,
    pub count: usize,
    pub data: Vec<Value>,
}

/// Read-only, per-request scans over the partitioned lake.
pub struct QueryEngine {
    root: PathBuf,
    catalog: Arc<dyn SourceCatalog>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<dyn SourceCatalog>, config: QueryConfig) -> Self {
        Self {
            root: root.into(),
            catalog,
            config,
        }
    }

    pub async fn query(&self, request: &FilterRequest) -> Result<QueryResult> {
        let source_name = request.source_name.as_str();
        if !self.catalog.exists(source_name).await? {
            return Err(Error::SourceNotFound(source_name.to_string()));
        }

        let data = self.scan(request).await.map_err(|e| match e {
            Error::InvalidInput(_) => e,
            other => {
                error!(source = %source_name, error = %other, "Query failed");
                Error::QueryFailed {
                    source_name: source_name.to_string(),
                    message: other.to_string(),
                }
            }
        })?;

        info!(source = %source_name, rows = data.len(), "Query served");
        Ok(QueryResult {
            source: source_name.to_string(),
            count: data.len(),
            data,
        })
    }

    async fn scan(&self, request: &FilterRequest) -> Result<Vec<Value>> {
        let dir = source_dir(&self.root, &request.source_name);
        let source_name = request.source_name.clone();
        let batches = tokio::task::spawn_blocking(move || load_source(&dir, &source_name))
            .await
            .map_err(|e| Error::Other(format!("scan task failed: {}", e)))??;

        let Some(schema) = batches.first().map(RecordBatch::schema) else {
            debug!(source = %request.source_name, "Source has no data files");
            return Ok(Vec::new());
        };

        let ctx = SessionContext::new();
        let table = MemTable::try_new(schema, vec![batches])?;
        let df = ctx.read_table(Arc::new(table))?;

        let df = self.apply_filters(df, request)?;
        let df = project_declared(df, &request.source_name)?;
        let batches = df.limit(0, Some(request.limit))?.collect().await?;

        batches_to_json(&batches)
    }

    fn apply_filters(&self, df: DataFrame, request: &FilterRequest) -> Result<DataFrame> {
        let has_column = |name: &str| df.schema().has_column_with_unqualified_name(name);
        let year_column = self.config.year_column.as_str();
        let region_column = self.config.region_column.as_str();
        let mut builder = PredicateBuilder::new();

        if request.year_start.is_some() || request.year_end.is_some() {
            require_column(has_column(year_column), year_column, request)?;
        }
        if let Some(year) = request.year_start {
            builder.year_at_least(year_column, year);
        }
        if let Some(year) = request.year_end {
            builder.year_at_most(year_column, year);
        }

        if let Some(region) = &request.region {
            require_column(has_column(region_column), region_column, request)?;
            builder.contains_ignore_case(&[region_column.to_string()], region);
        }

        if let Some(text) = &request.text {
            let searchable: Vec<String> = self
                .config
                .text_columns
                .iter()
                .filter(|c| has_column(c.as_str()))
                .cloned()
                .collect();
            builder.contains_ignore_case(&searchable, text);
        }

        match builder.build() {
            Some((predicate, params)) => Ok(df.filter(predicate)?.with_param_values(params)?),
            None => Ok(df),
        }
    }
}

fn require_column(present: bool, column: &str, request: &FilterRequest) -> Result<()> {
    if present {
        return Ok(());
    }
    debug!(
        source = %request.source_name,
        column = %column,
        "Filter rejected, source has no such column"
    );
    Err(Error::InvalidInput(format!(
        "source '{}' has no '{}' column to filter on",
        request.source_name, column
    )))
}

/// Reads every data file of a source and appends its partition values as
/// columns, typed from the declared schema when there is one. Null
/// partitions and values that do not fit the declared type become nulls.
fn load_source(dir: &Path, source_name: &str) -> Result<Vec<RecordBatch>> {
    let declaration = schema_for(source_name);
    let mut batches = Vec::new();

    for leaf in discover_partitions(dir)? {
        for path in &leaf.files {
            let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
            for batch in reader {
                batches.push(with_partition_columns(batch?, &leaf.partition, declaration)?);
            }
        }
    }

    debug!(source = %source_name, batches = batches.len(), "Source loaded");
    Ok(batches)
}

fn with_partition_columns(
    batch: RecordBatch,
    partition: &PartitionPath,
    declaration: Option<&SchemaDeclaration>,
) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let mut fields: Vec<FieldRef> = batch.schema().fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    for (key, value) in partition.segments() {
        let data_type = declaration
            .and_then(|d| d.data_type_of(key))
            .unwrap_or(DataType::Utf8);
        let text: ArrayRef = Arc::new(StringArray::from(vec![value.as_deref(); num_rows]));
        columns.push(cast(&text, &data_type)?);
        fields.push(Arc::new(Field::new(key, data_type, true)));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &options,
    )?)
}

/// Puts the columns of a declared source back in declared order; partition
/// columns otherwise come last.
fn project_declared(df: DataFrame, source_name: &str) -> Result<DataFrame> {
    let Some(declaration) = schema_for(source_name) else {
        return Ok(df);
    };
    let present: Vec<&str> = declaration
        .column_names()
        .into_iter()
        .filter(|name| df.schema().has_column_with_unqualified_name(name))
        .collect();
    if present.is_empty() {
        return Ok(df);
    }
    Ok(df.select_columns(&present)?)
}
