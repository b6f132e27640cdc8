//! Google API access tokens.
//!
//! Credentials themselves are managed outside this service; these providers
//! only fetch a bearer token from whatever the deployment already trusts.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Scopes needed for the spreadsheet and the archive.
pub const GOOGLE_API_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// `gcloud` does not report expiry; its tokens live an hour.
const GCLOUD_TOKEN_TTL_SECS: i64 = 45 * 60;

/// Source of bearer tokens for Google APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Source name for logs (e.g., "static", "metadata").
    fn name(&self) -> &str;

    async fn access_token(&self) -> Result<String>;
}

/// A token supplied through configuration.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    fn name(&self) -> &str {
        "static"
    }

    async fn access_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            bail!("No Google access token configured");
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Token of the attached service account on GCE, Cloud Run, or GKE.
pub struct MetadataServerToken {
    client: Client,
    url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: METADATA_TOKEN_URL.to_string(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl TokenProvider for MetadataServerToken {
    fn name(&self) -> &str {
        "metadata"
    }

    async fn access_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(now)) {
            return Ok(cached.token.clone());
        }

        debug!(url = %self.url, "Fetching access token from metadata server");
        let response = self
            .client
            .get(&self.url)
            .query(&[("scopes", GOOGLE_API_SCOPES.join(","))])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .context("Metadata server request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Metadata server returned {}: {}", status, body);
        }

        let token: MetadataTokenResponse = response
            .json()
            .await
            .context("Failed to parse metadata token response")?;

        info!(expires_in = token.expires_in, "Obtained Google access token");
        *cache = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(token.access_token)
    }
}

/// Token printed by `gcloud auth print-access-token`, for local runs.
pub struct GcloudCliToken {
    program: String,
    cache: Mutex<Option<CachedToken>>,
}

impl GcloudCliToken {
    pub fn new() -> Self {
        Self {
            program: "gcloud".to_string(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for GcloudCliToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for GcloudCliToken {
    fn name(&self) -> &str {
        "gcloud"
    }

    async fn access_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(now)) {
            return Ok(cached.token.clone());
        }

        let output = Command::new(&self.program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} auth print-access-token failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            bail!("{} printed an empty access token", self.program);
        }

        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at: now + Duration::seconds(GCLOUD_TOKEN_TTL_SECS),
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_returns_value() {
        let provider = StaticToken::new("ya29.token");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");
        assert_eq!(provider.name(), "static");
    }

    #[tokio::test]
    async fn blank_static_token_is_error() {
        assert!(StaticToken::new("  ").access_token().await.is_err());
    }

    #[test]
    fn cached_token_freshness_respects_margin() {
        let now = Utc::now();
        let fresh = CachedToken {
            token: "t".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECS * 2),
        };
        let stale = CachedToken {
            token: "t".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECS / 2),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[tokio::test]
    async fn missing_gcloud_binary_is_error() {
        let provider = GcloudCliToken::new().with_program("scaleslip-no-such-gcloud");
        let err = provider.access_token().await.unwrap_err();
        assert!(err.to_string().contains("scaleslip-no-such-gcloud"));
    }
}
