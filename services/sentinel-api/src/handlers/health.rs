//! Health check handler.

use axum::{extract::Extension, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

const SERVICE_NAME: &str = "sentinel-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub gee_initialized: bool,
    pub timestamp: String,
}

/// GET /api/health (also mounted at /health)
///
/// Reports process metadata and the startup initializer's recorded
/// outcome. No side effects.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    let initialized = state.gee_initialized();

    Json(HealthResponse {
        status: if initialized { "healthy" } else { "degraded" }.to_string(),
        service: SERVICE_NAME.to_string(),
        gee_initialized: initialized,
        timestamp: Utc::now().to_rfc3339(),
    })
}
