use serde::{Deserialize, Serialize};

use crate::processor::FilterRequest;

// Request models
#[derive(Debug, Default, Deserialize)]
pub struct DataQueryParams {
    pub limit: Option<usize>,
    #[serde(alias = "annee_debut")]
    pub year_start: Option<i32>,
    #[serde(alias = "annee_fin")]
    pub year_end: Option<i32>,
    #[serde(alias = "pays")]
    pub region: Option<String>,
    #[serde(alias = "text")]
    pub q: Option<String>,
}

impl DataQueryParams {
    /// Blank text parameters are treated as absent.
    pub fn into_filter(self, source_name: String, default_limit: usize) -> FilterRequest {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        FilterRequest {
            source_name,
            limit: self.limit.unwrap_or(default_limit),
            year_start: self.year_start,
            year_end: self.year_end,
            region: non_blank(self.region),
            text: non_blank(self.q),
        }
    }
}

// Response models
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}
