use common::config::Settings;
use common::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::normalizers::{SourceNormalizer, all_normalizers};
use crate::quality::QualityReport;
use crate::writer::{PartitionedWriter, WriteSummary};

#[derive(Debug, Clone, Serialize)]
pub struct FailedSource {
    pub source_name: String,
    pub error: String,
}

/// Outcome of one transformation run across all sources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformSummary {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedSource>,
    pub reports: Vec<QualityReport>,
    pub writes: Vec<WriteSummary>,
}

impl TransformSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record_outcome(&mut self, source_name: &str, outcome: Result<SourceOutcome>) {
        match outcome {
            Ok(SourceOutcome::Written(report, write)) => {
                self.succeeded.push(source_name.to_string());
                self.reports.push(report);
                self.writes.push(write);
            }
            Ok(SourceOutcome::MissingRawFile(path)) => {
                warn!(
                    source = %source_name,
                    path = %path.display(),
                    "Raw file not found, skipping source"
                );
                self.skipped.push(source_name.to_string());
            }
            Err(e) => {
                error!(source = %source_name, error = %e, "Source transformation failed");
                self.failed.push(FailedSource {
                    source_name: source_name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

enum SourceOutcome {
    Written(QualityReport, WriteSummary),
    MissingRawFile(PathBuf),
}

/// Raw file location of a known source, or `None` for a source without a
/// configured file.
pub fn raw_file_for(settings: &Settings, source_name: &str) -> Option<PathBuf> {
    let file = match source_name {
        "rte" => &settings.raw_files.rte,
        "world_bank" => &settings.raw_files.world_bank,
        "stock_prices" => &settings.raw_files.stock_prices,
        _ => return None,
    };
    Some(settings.paths.raw_dir.join(file))
}

/// Rebuilds the processed lake from the raw files, source by source.
///
/// Sources are independent: a failing source is logged and recorded, and
/// the run moves on to the next one.
pub fn run_transform(settings: &Settings) -> TransformSummary {
    run_sources(&all_normalizers(), settings)
}

pub fn run_sources(normalizers: &[Box<dyn SourceNormalizer>], settings: &Settings) -> TransformSummary {
    let writer = PartitionedWriter::new(&settings.paths.processed_dir);
    let mut summary = TransformSummary::default();

    info!(
        raw_dir = %settings.paths.raw_dir.display(),
        processed_dir = %settings.paths.processed_dir.display(),
        sources = normalizers.len(),
        "Starting transformation run"
    );

    for normalizer in normalizers {
        let source_name = normalizer.source_name();
        let outcome = match raw_file_for(settings, source_name) {
            Some(path) => transform_source(normalizer.as_ref(), &path, &writer),
            None => Err(Error::Other(format!(
                "no raw file configured for source '{}'",
                source_name
            ))),
        };
        summary.record_outcome(source_name, outcome);
    }

    info!(
        succeeded = summary.succeeded.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "Transformation run finished"
    );

    summary
}

fn transform_source(
    normalizer: &dyn SourceNormalizer,
    path: &Path,
    writer: &PartitionedWriter,
) -> Result<SourceOutcome> {
    let source_name = normalizer.source_name();
    if !path.is_file() {
        return Ok(SourceOutcome::MissingRawFile(path.to_path_buf()));
    }

    info!(source = %source_name, path = %path.display(), "Transforming source");

    let raw = normalizer.load(path).map_err(|e| match e {
        Error::Structural { .. } => e,
        other => Error::structural(source_name, other.to_string()),
    })?;

    let normalized = normalizer.normalize(&raw)?;
    let write = writer.write(&normalized.batch, source_name, normalizer.partition_keys())?;

    Ok(SourceOutcome::Written(normalized.report, write))
}
