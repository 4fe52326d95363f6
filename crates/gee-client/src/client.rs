//! The Earth Engine REST client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccountKey;
use crate::error::GeeError;
use crate::expression::Expression;

const DEFAULT_BASE_URL: &str = "https://earthengine.googleapis.com/v1";

/// Display-range and palette options attached to a map request.
///
/// Band selection happens inside the expression itself; these options only
/// control how the selected bands are stretched and colored.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationOptions {
    pub ranges: Vec<VisRange>,
    #[serde(rename = "paletteColors", skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisRange {
    pub min: f64,
    pub max: f64,
}

/// Tile-serving identifier issued by `projects.maps.create`.
#[derive(Debug, Clone)]
pub struct MapId {
    /// Opaque resource name, `projects/{project}/maps/{id}`.
    pub name: String,
    /// XYZ tile URL template with `{z}/{x}/{y}` placeholders.
    pub tile_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateMapResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    message: String,
}

/// Authenticated session with the Earth Engine REST API.
///
/// Read-only after initialization; safe to share behind an `Arc`.
pub struct GeeClient {
    http: reqwest::Client,
    auth: TokenProvider,
    project: String,
    base_url: String,
}

impl GeeClient {
    /// Establish a session: build the HTTP client and perform the first
    /// token exchange. One-shot and non-retried; this runs once at process
    /// boot, not on the request path.
    #[instrument(skip(key), fields(project = %key.project_id))]
    pub async fn initialize(key: ServiceAccountKey) -> Result<Self, GeeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let project = key.project_id.clone();
        let auth = TokenProvider::new(key, http.clone())?;

        // Prove the credential works before reporting success.
        auth.token().await?;
        info!("Earth Engine session established");

        Ok(Self {
            http,
            auth,
            project,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL. Test hook.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The service account's cloud project.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Create a tile map for an image expression and return the identifier
    /// plus its XYZ tile URL template.
    #[instrument(skip(self, expression, visualization))]
    pub async fn create_map(
        &self,
        expression: &Expression,
        visualization: &VisualizationOptions,
    ) -> Result<MapId, GeeError> {
        let url = format!("{}/projects/{}/maps", self.base_url, self.project);
        let body = serde_json::json!({
            "expression": expression.as_json(),
            "fileFormat": "PNG",
            "visualizationOptions": visualization,
        });

        let response: CreateMapResponse = self.post_json(&url, &body).await?;
        let tile_url = tile_url_template(&self.base_url, &response.name);
        debug!(map = %response.name, "Map created");

        Ok(MapId {
            name: response.name,
            tile_url,
        })
    }

    /// Synchronously evaluate an expression to a plain JSON value
    /// (collection sizes, aggregated attribute arrays).
    #[instrument(skip(self, expression))]
    pub async fn compute_value(&self, expression: &Expression) -> Result<Value, GeeError> {
        let url = format!("{}/projects/{}/value:compute", self.base_url, self.project);
        let body = serde_json::json!({ "expression": expression.as_json() });

        let response: ComputeValueResponse = self.post_json(&url, &body).await?;
        Ok(response.result)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, GeeError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RemoteErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(GeeError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GeeError::UnexpectedResponse(e.to_string()))
    }
}

/// XYZ tile URL template for a map resource name, with literal `{z}`,
/// `{x}`, `{y}` placeholders for the map client to substitute.
pub fn tile_url_template(base_url: &str, map_name: &str) -> String {
    format!("{}/{}/tiles/{{z}}/{{x}}/{{y}}", base_url, map_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_template_placeholders() {
        let url = tile_url_template(DEFAULT_BASE_URL, "projects/ee-example/maps/abc123");
        assert_eq!(
            url,
            "https://earthengine.googleapis.com/v1/projects/ee-example/maps/abc123/tiles/{z}/{x}/{y}"
        );
        assert!(url.contains("{z}") && url.contains("{x}") && url.contains("{y}"));
    }

    #[test]
    fn test_visualization_options_serialization() {
        let vis = VisualizationOptions {
            ranges: vec![VisRange {
                min: -1.0,
                max: 1.0,
            }],
            palette: Some(vec!["red".into(), "yellow".into(), "green".into()]),
        };
        let json = serde_json::to_value(&vis).unwrap();
        assert_eq!(json["ranges"][0]["min"], -1.0);
        assert_eq!(json["paletteColors"][1], "yellow");
    }

    #[test]
    fn test_visualization_options_omits_absent_palette() {
        let vis = VisualizationOptions {
            ranges: vec![VisRange {
                min: 0.0,
                max: 3000.0,
            }],
            palette: None,
        };
        let json = serde_json::to_value(&vis).unwrap();
        assert!(json.get("paletteColors").is_none());
    }

    #[test]
    fn test_remote_error_body_parsing() {
        let text = r#"{"error":{"code":400,"message":"Image.select: band not found","status":"INVALID_ARGUMENT"}}"#;
        let body: RemoteErrorBody = serde_json::from_str(text).unwrap();
        assert_eq!(body.error.message, "Image.select: band not found");
    }
}
