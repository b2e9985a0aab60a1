use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use parquet::errors::ParquetError;
use thiserror::Error;

pub mod config;
pub mod layout;
pub mod schema;
pub mod telemetry;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No schema declared for source '{0}'")]
    SchemaMissing(String),

    /// The raw file for a source does not have the shape its normalizer needs.
    #[error("Structural error in raw data for '{source_name}': {message}")]
    Structural { source_name: String, message: String },

    #[error("Source '{0}' not found")]
    SourceNotFound(String),

    #[error("Internal server error for source '{source_name}': {message}")]
    QueryFailed { source_name: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn structural(source_name: &str, message: impl Into<String>) -> Self {
        Error::Structural {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}
