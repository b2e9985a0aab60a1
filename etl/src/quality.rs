use arrow::record_batch::RecordBatch;
use serde::Serialize;
use tracing::{info, warn};

use crate::raw::RawTable;

/// Before/after row accounting for one normalizer run. Reporting only:
/// computing a report never touches the data.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub source_name: String,
    pub rows_before: usize,
    pub rows_after: usize,
    /// `None` when a key column is missing from the raw table.
    pub duplicates_before: Option<usize>,
    pub key_columns: Vec<String>,
}

impl QualityReport {
    pub fn compute(
        source_name: &str,
        before: &RawTable,
        after: &RecordBatch,
        key_columns: &[&str],
    ) -> Self {
        Self {
            source_name: source_name.to_string(),
            rows_before: before.len(),
            rows_after: after.num_rows(),
            duplicates_before: before.duplicate_count(key_columns),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn emit(&self) {
        if let Some(duplicates) = self.duplicates_before.filter(|d| *d > 0) {
            warn!(
                source = %self.source_name,
                duplicates,
                keys = ?self.key_columns,
                "Logical duplicates detected"
            );
        }

        let duplicates = self
            .duplicates_before
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        info!(
            source = %self.source_name,
            rows_before = self.rows_before,
            rows_after = self.rows_after,
            rows_removed = self.rows_removed(),
            duplicates = %duplicates,
            "Data quality report"
        );
    }
}
