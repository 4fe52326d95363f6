//! Application state and shared resources.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use gee_client::{GeeClient, ServiceAccountKey};

/// Shared application state.
///
/// The Earth Engine session is established once at startup and is
/// read-only afterwards. Initialization failure leaves the service in a
/// degraded state (`gee: None`): the process still serves traffic so that
/// health checks can report the failure, but image requests are refused.
pub struct AppState {
    pub gee: Option<GeeClient>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initialize from the environment, degrading on any startup failure.
    pub async fn new() -> Self {
        let gee = match ServiceAccountKey::from_env() {
            Ok(key) => match GeeClient::initialize(key).await {
                Ok(client) => {
                    info!(project = %client.project(), "Earth Engine initialized");
                    Some(client)
                }
                Err(e) => {
                    error!(error = %e, "Earth Engine initialization failed, starting degraded");
                    None
                }
            },
            Err(e) => {
                error!(error = %e, "Could not load GEE credentials, starting degraded");
                None
            }
        };

        Self {
            gee,
            started_at: Utc::now(),
        }
    }

    /// State with no Earth Engine session. Test hook for degraded-mode paths.
    pub fn uninitialized() -> Self {
        Self {
            gee: None,
            started_at: Utc::now(),
        }
    }

    /// Whether the startup initializer succeeded.
    pub fn gee_initialized(&self) -> bool {
        self.gee.is_some()
    }
}
