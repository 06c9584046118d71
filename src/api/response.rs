use crate::models::RunReport;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        json_response(&self)
    }
}

/// Body of a successful cron trigger
#[derive(Serialize)]
pub struct CronResponse {
    pub success: bool,
    pub report: RunReport,
}

impl IntoResponse for CronResponse {
    fn into_response(self) -> Response {
        json_response(&self)
    }
}

fn json_response<T: Serialize>(body: &T) -> Response {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        json,
    )
        .into_response()
}
