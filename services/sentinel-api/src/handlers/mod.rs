//! HTTP request handlers.

mod health;
mod imagery;
mod regions;

pub use health::{health_handler, HealthResponse};
pub use imagery::{get_sentinel_image_handler, ImageRequest, ImageResponse, LayerInfo};
pub use regions::{regions_handler, RegionsResponse};

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

use sentinel_common::ApiError;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET / - Embedded map page.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> String {
    handle.render()
}

/// Handler-boundary error wrapper rendering the uniform failure body.
///
/// Every failure surfaces as `{"success": false, "error": ...}` with the
/// status code the error carries; nothing propagates past a handler.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError(err)
    }
}

impl From<gee_client::GeeError> for AppError {
    fn from(err: gee_client::GeeError) -> Self {
        AppError(ApiError::Remote(err.to_string()))
    }
}

impl From<sentinel_common::bbox::BboxParseError> for AppError {
    fn from(err: sentinel_common::bbox::BboxParseError) -> Self {
        AppError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
