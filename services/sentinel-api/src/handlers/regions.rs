//! GET /api/regions - region list handler.

use axum::{extract::Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};

use sentinel_common::{ApiError, ApiResult};

use crate::imagery::regions_expression;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

/// GET /api/regions
///
/// The region list is optional enrichment for the map client, so this
/// endpoint degrades to an empty list on any failure instead of surfacing
/// an error body. The failure is still logged.
#[instrument(skip(state))]
pub async fn regions_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<RegionsResponse> {
    let regions = match fetch_regions(&state).await {
        Ok(regions) => regions,
        Err(e) => {
            warn!(error = %e, "Region query failed, returning empty list");
            Vec::new()
        }
    };

    Json(RegionsResponse { regions })
}

async fn fetch_regions(state: &AppState) -> ApiResult<Vec<String>> {
    let gee = state.gee.as_ref().ok_or(ApiError::NotInitialized)?;

    let value = gee
        .compute_value(&regions_expression())
        .await
        .map_err(|e| ApiError::Remote(e.to_string()))?;

    let regions = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Ok(regions)
}
