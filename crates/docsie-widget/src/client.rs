//! Client transport for the token and configuration endpoints
//!
//! Failures here never abort the mount: a missing token degrades to an
//! unauthenticated widget, and only a missing deployment configuration stops
//! the bootstrap (there is nothing to mount without a deployment id).

use serde::Deserialize;
use tracing::{info, warn};

use crate::bootstrap::WidgetBootstrap;
use crate::config::{BootstrapConfig, Handshake};
use crate::error::{BootstrapError, Result};
use crate::host::Host;
use crate::signal::LoadFuture;

const TOKEN_PATH: &str = "/api/auth/token";
const CONFIG_PATH: &str = "/api/config/docsie";

/// Deployment data served by `GET /api/config/docsie`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsieConfig {
    pub deployment_id: String,
    #[serde(default)]
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP client for the auth server.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a widget token. `None` on any failure.
    pub async fn fetch_token(&self) -> Option<String> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        let response = match self.http.post(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "error getting JWT token");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "token endpoint returned an error");
            return None;
        }

        match response.json::<TokenResponse>().await {
            Ok(body) if !body.token.is_empty() => Some(body.token),
            Ok(_) => {
                warn!(%url, "token endpoint returned an empty token");
                None
            }
            Err(e) => {
                warn!(%url, error = %e, "invalid token response");
                None
            }
        }
    }

    /// Request the deployment configuration. `None` on any failure.
    pub async fn fetch_config(&self) -> Option<DocsieConfig> {
        let url = format!("{}{CONFIG_PATH}", self.base_url);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "error getting Docsie config");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "failed to get Docsie config");
            return None;
        }

        match response.json::<DocsieConfig>().await {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(%url, error = %e, "invalid Docsie config response");
                None
            }
        }
    }
}

/// Fetch token and configuration, then mount the widget into `container`.
///
/// Proceeds without a token when the token request fails; fails with
/// [`BootstrapError::ConfigUnavailable`] when the configuration request does.
pub async fn mount<H: Host>(
    client: &AuthClient,
    bootstrap: &mut WidgetBootstrap<H>,
    container: &str,
    handshake: Handshake,
) -> Result<LoadFuture> {
    let token = client.fetch_token().await;
    if token.is_none() {
        warn!(container, "no token available; mounting unauthenticated widget");
    }

    let docsie = client
        .fetch_config()
        .await
        .ok_or(BootstrapError::ConfigUnavailable)?;

    let config = BootstrapConfig {
        deployment_id: docsie.deployment_id,
        token,
        fallback_url: Some(docsie.redirect_url).filter(|u| !u.is_empty()),
    };

    info!(container, ?handshake, "mounting Docsie widget");
    bootstrap.initialize(container, &config, handshake)
}
