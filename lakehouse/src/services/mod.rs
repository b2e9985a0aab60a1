pub mod lakehouse;
pub use lakehouse::LakehouseService;

use crate::api::models::ApiResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};

pub struct AppError(pub common::Error);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            common::Error::SourceNotFound(_) => StatusCode::NOT_FOUND,
            common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        let body = Json(ApiResponse::<()>::error(self.0.to_string()));
        (status_code, body).into_response()
    }
}

impl From<common::Error> for AppError {
    fn from(err: common::Error) -> Self {
        AppError(err)
    }
}
