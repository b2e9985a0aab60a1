pub mod normalizers;
pub mod quality;
pub mod raw;
pub mod runner;
pub mod writer;

pub use normalizers::{Normalized, SourceNormalizer, all_normalizers};
pub use quality::QualityReport;
pub use raw::{HeaderLocator, RawTable};
pub use runner::{TransformSummary, run_sources, run_transform};
pub use writer::{CastReport, CastWarning, PartitionedWriter, WriteSummary, conform_to_schema};
