//! OAuth2 jwt-bearer grant for service accounts.
//!
//! Signs an RS256 JWT with the service-account private key and exchanges it
//! at the token endpoint for a short-lived access token. Tokens are cached
//! and refreshed shortly before expiry; the provider handle itself is
//! read-only after construction.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::credentials::ServiceAccountKey;
use crate::error::GeeError;

/// Scopes required for Earth Engine REST calls.
const SCOPES: &str =
    "https://www.googleapis.com/auth/earthengine https://www.googleapis.com/auth/cloud-platform";

/// Refresh when less than this remains on the cached token.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches access tokens for one service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Build a provider from a parsed service-account key.
    ///
    /// Fails if the private key is not valid RSA PEM.
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, GeeError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| GeeError::InvalidCredentials(format!("private_key: {}", e)))?;

        Ok(Self {
            key,
            signing_key,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, exchanging a fresh assertion if the
    /// cached one is absent or about to expire.
    pub async fn token(&self) -> Result<String, GeeError> {
        let mut cached = self.cached.lock().await;

        if let Some(t) = cached.as_ref() {
            if t.expires_at - Utc::now() > Duration::seconds(EXPIRY_MARGIN_SECS) {
                return Ok(t.token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    #[instrument(skip(self), fields(account = %self.key.client_email))]
    async fn exchange(&self) -> Result<CachedToken, GeeError> {
        let now = Utc::now();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| GeeError::Auth(format!("assertion signing failed: {}", e)))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeeError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GeeError::Auth(format!("malformed token response: {}", e)))?;

        debug!(expires_in = token.expires_in, "Access token refreshed");

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
