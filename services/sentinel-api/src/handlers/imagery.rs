//! POST /api/get_sentinel_image - composite request handler.

use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use sentinel_common::{ApiError, BoundingBox, LayerKind};

use super::AppError;
use crate::imagery::ImageQuery;
use crate::state::AppState;

fn default_cloud_filter() -> f64 {
    30.0
}

fn default_smoothing() -> bool {
    true
}

/// Request body. Required fields are `Option` so their absence surfaces as
/// the API's own error body rather than an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub bounds: Option<Vec<f64>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_cloud_filter")]
    pub cloud_filter: f64,
    #[serde(default = "default_smoothing")]
    pub smoothing: bool,
    #[serde(default)]
    pub layer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub success: bool,
    pub tile_url: String,
    pub image_count: u64,
    pub layer_info: LayerInfo,
}

#[derive(Debug, Serialize)]
pub struct LayerInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

/// POST /api/get_sentinel_image
#[instrument(skip(state, request))]
pub async fn get_sentinel_image_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let query = build_query(request)?;

    info!(
        start = %query.start_date,
        end = %query.end_date,
        cloud_filter = query.cloud_filter,
        layer = query.layer.tag(),
        "Image request"
    );
    metrics::counter!("image_requests_total", "layer" => query.layer.tag()).increment(1);

    let gee = state.gee.as_ref().ok_or(ApiError::NotInitialized)?;

    let map = gee
        .create_map(&query.composite_expression(), &query.visualization())
        .await?;

    // Second synchronous round-trip for the count; the map identifier does
    // not carry it.
    let count = gee.compute_value(&query.count_expression()).await?;
    let image_count = count.as_u64().unwrap_or(0);

    info!(image_count, map = %map.name, "Image request served");

    let config = query.layer.config();
    Ok(Json(ImageResponse {
        success: true,
        tile_url: map.tile_url,
        image_count,
        layer_info: LayerInfo {
            kind: query.layer.tag(),
            description: config.description,
        },
    }))
}

/// Validate the body and apply defaults before anything touches the remote
/// service. Bounding-box ordinates are not range-checked here; Earth
/// Engine rejects malformed geometry itself.
fn build_query(request: ImageRequest) -> Result<ImageQuery, AppError> {
    let bounds = request
        .bounds
        .ok_or_else(|| ApiError::MissingField("bounds".to_string()))?;
    let bbox = BoundingBox::from_array(&bounds)?;

    let start_date = request
        .start_date
        .ok_or_else(|| ApiError::MissingField("start_date".to_string()))?;
    let end_date = request
        .end_date
        .ok_or_else(|| ApiError::MissingField("end_date".to_string()))?;

    let layer = LayerKind::from_tag(request.layer.as_deref().unwrap_or("TRUE_COLOR"));

    Ok(ImageQuery {
        bbox,
        start_date,
        end_date,
        cloud_filter: request.cloud_filter,
        smoothing: request.smoothing,
        layer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let request: ImageRequest = serde_json::from_str(
            r#"{"bounds":[30.0,45.0,32.0,47.0],"start_date":"2024-06-01","end_date":"2024-06-30"}"#,
        )
        .unwrap();
        let query = build_query(request).unwrap();

        assert_eq!(query.cloud_filter, 30.0);
        assert!(query.smoothing);
        assert_eq!(query.layer, LayerKind::TrueColor);
    }

    #[test]
    fn test_unknown_layer_falls_back_to_true_color() {
        let request: ImageRequest = serde_json::from_str(
            r#"{"bounds":[0.0,0.0,1.0,1.0],"start_date":"a","end_date":"b","layer":"THERMAL"}"#,
        )
        .unwrap();
        let query = build_query(request).unwrap();
        assert_eq!(query.layer, LayerKind::TrueColor);
    }

    #[test]
    fn test_missing_bounds_rejected() {
        let request: ImageRequest =
            serde_json::from_str(r#"{"start_date":"a","end_date":"b"}"#).unwrap();
        let err = build_query(request).unwrap_err();
        assert!(matches!(err.0, ApiError::MissingField(ref f) if f == "bounds"));
    }

    #[test]
    fn test_short_bounds_rejected() {
        let request: ImageRequest = serde_json::from_str(
            r#"{"bounds":[0.0,1.0],"start_date":"a","end_date":"b"}"#,
        )
        .unwrap();
        let err = build_query(request).unwrap_err();
        assert!(matches!(err.0, ApiError::InvalidField { ref field, .. } if field == "bounds"));
    }
}
