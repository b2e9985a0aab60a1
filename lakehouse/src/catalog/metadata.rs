use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

pub const NO_METADATA: &str = "No metadata available.";

/// Human-readable reference data about a source. Static, never derived from
/// the stored data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_coverage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
}

impl MetadataDescriptor {
    pub fn fallback(source_name: &str) -> Self {
        Self {
            identifier: None,
            display_name: source_name.to_string(),
            producer: None,
            dataset_name: None,
            description: NO_METADATA.to_string(),
            units: None,
            temporal_coverage: None,
            file_format: None,
            access_method: None,
            link: None,
            api_access: None,
            update_frequency: None,
            last_updated: None,
            maintainer: None,
        }
    }
}

struct Entry {
    source: &'static str,
    identifier: &'static str,
    display_name: &'static str,
    producer: &'static str,
    dataset_name: &'static str,
    description: &'static str,
    units: &'static str,
    temporal_coverage: &'static str,
    file_format: &'static str,
    access_method: &'static str,
    link: &'static str,
    api_access: &'static str,
    update_frequency: &'static str,
    last_updated: &'static str,
    maintainer: &'static str,
}

impl From<&Entry> for MetadataDescriptor {
    fn from(entry: &Entry) -> Self {
        let some = |s: &str| Some(s.to_string());
        Self {
            identifier: some(entry.identifier),
            display_name: entry.display_name.to_string(),
            producer: some(entry.producer),
            dataset_name: some(entry.dataset_name),
            description: entry.description.to_string(),
            units: some(entry.units),
            temporal_coverage: some(entry.temporal_coverage),
            file_format: some(entry.file_format),
            access_method: some(entry.access_method),
            link: some(entry.link),
            api_access: some(entry.api_access),
            update_frequency: some(entry.update_frequency),
            last_updated: some(entry.last_updated),
            maintainer: some(entry.maintainer),
        }
    }
}

const ENTRIES: [Entry; 3] = [
    Entry {
        source: "rte",
        identifier: "FR-RTE-01",
        display_name: "Réseau de Transport d'Électricité (RTE)",
        producer: "RTE",
        dataset_name: "eCO2mix - Données nationales temps réel",
        description: "Electricity production by generation type in France at 15 to 30 minute \
                      granularity. Core input for analysing the French energy mix.",
        units: "MW",
        temporal_coverage: "Since 2012",
        file_format: "CSV",
        access_method: "Direct download from the OpenDataSoft portal",
        link: "https://odre.opendatasoft.com/explore/dataset/eco2mix-national-cons-def/information/",
        api_access: "Yes (Opendatasoft API v2)",
        update_frequency: "Real time",
        last_updated: "Continuous",
        maintainer: "RTE Open Data team",
    },
    Entry {
        source: "world_bank",
        identifier: "INT-WB-01",
        display_name: "The World Bank",
        producer: "The World Bank Group",
        dataset_name: "Renewable electricity output (% of total electricity output)",
        description: "Share of electricity produced from renewable sources, excluding \
                      hydroelectric, per country.",
        units: "%",
        temporal_coverage: "Annual, since 1990",
        file_format: "XLS",
        access_method: "Direct download from the data portal",
        link: "https://data.worldbank.org/indicator/EG.ELC.RNWX.ZS",
        api_access: "Yes (World Bank Data API)",
        update_frequency: "Annual",
        last_updated: "Annual",
        maintainer: "World Bank Data Group",
    },
    Entry {
        source: "stock_prices",
        identifier: "FIN-YFIN-01",
        display_name: "Yahoo Finance",
        producer: "Yahoo!",
        dataset_name: "Historical stock prices",
        description: "Daily OHLCV market data for major renewable-energy companies.",
        units: "Local exchange currency",
        temporal_coverage: "Five-year history",
        file_format: "CSV (via client library)",
        access_method: "yfinance client library",
        link: "https://finance.yahoo.com/",
        api_access: "Unofficial (via yfinance)",
        update_frequency: "Daily",
        last_updated: "Continuous",
        maintainer: "N/A",
    },
];

static CATALOG: Lazy<HashMap<&'static str, MetadataDescriptor>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|entry| (entry.source, MetadataDescriptor::from(entry)))
        .collect()
});

/// Metadata for a source, or a minimal fallback carrying only its name.
pub fn describe(source_name: &str) -> MetadataDescriptor {
    CATALOG
        .get(source_name)
        .cloned()
        .unwrap_or_else(|| MetadataDescriptor::fallback(source_name))
}
