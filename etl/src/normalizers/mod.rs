pub mod columns;
mod rte;
mod stock_prices;
mod world_bank;

pub use rte::RteNormalizer;
pub use stock_prices::StockPricesNormalizer;
pub use world_bank::WorldBankNormalizer;

use arrow::record_batch::RecordBatch;
use common::Result;
use std::path::Path;

use crate::quality::QualityReport;
use crate::raw::RawTable;

/// Output of a normalizer: the canonical table plus its quality report.
#[derive(Debug)]
pub struct Normalized {
    pub batch: RecordBatch,
    pub report: QualityReport,
}

/// Turns one raw extract into a canonical table for a given source.
///
/// Value-level parse failures become nulls or dropped rows; only a raw file
/// lacking the columns a normalizer needs is an error.
pub trait SourceNormalizer: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Columns whose values decide the partition directory of each row.
    fn partition_keys(&self) -> &'static [&'static str];

    /// Raw column names used to count logical duplicates before cleaning.
    fn quality_key(&self) -> &'static [&'static str];

    fn load(&self, path: &Path) -> Result<RawTable>;

    fn normalize(&self, raw: &RawTable) -> Result<Normalized>;

    /// Computes and emits the quality report. Must run before the table is
    /// handed to the writer.
    fn report(&self, raw: &RawTable, batch: RecordBatch) -> Normalized {
        let report = QualityReport::compute(self.source_name(), raw, &batch, self.quality_key());
        report.emit();
        Normalized { batch, report }
    }
}

/// All normalizers in the order a transformation run visits them.
pub fn all_normalizers() -> Vec<Box<dyn SourceNormalizer>> {
    vec![
        Box::new(RteNormalizer),
        Box::new(WorldBankNormalizer),
        Box::new(StockPricesNormalizer),
    ]
}
