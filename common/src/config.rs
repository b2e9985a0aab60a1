use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub raw_files: RawFilesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
}

/// File names, relative to `paths.raw_dir`, that the acquisition layer drops
/// for each source.
#[derive(Debug, Deserialize, Clone)]
pub struct RawFilesConfig {
    #[serde(default = "default_rte_file")]
    pub rte: String,
    #[serde(default = "default_world_bank_file")]
    pub world_bank: String,
    #[serde(default = "default_stock_prices_file")]
    pub stock_prices: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
    #[serde(default = "default_text_columns")]
    pub text_columns: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            processed_dir: default_processed_dir(),
        }
    }
}

impl Default for RawFilesConfig {
    fn default() -> Self {
        Self {
            rte: default_rte_file(),
            world_bank: default_world_bank_file(),
            stock_prices: default_stock_prices_file(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            year_column: default_year_column(),
            region_column: default_region_column(),
            text_columns: default_text_columns(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_rte_file() -> String {
    "rte_eco2mix.csv".to_string()
}

fn default_world_bank_file() -> String {
    "world_bank_renewable.xls".to_string()
}

fn default_stock_prices_file() -> String {
    "stock_prices.csv".to_string()
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_limit() -> usize {
    1000
}

fn default_year_column() -> String {
    "annee".to_string()
}

fn default_region_column() -> String {
    "pays".to_string()
}

fn default_text_columns() -> Vec<String> {
    ["title", "abstract", "nom_politique", "nom_centrale"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from an optional TOML file, then `APP__*` environment
    /// variables (e.g. `APP__API__PORT=9000`).
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            raw_dir = %settings.paths.raw_dir.display(),
            processed_dir = %settings.paths.processed_dir.display(),
            "Loaded settings"
        );

        Ok(settings)
    }
}
