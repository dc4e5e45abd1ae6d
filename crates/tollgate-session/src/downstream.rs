//! Calls to the provider's resource API with a delegated credential.

use crate::error::SessionError;
use crate::provider::http_client;
use crate::record::DelegatedCredential;
use std::time::Duration;
use tollgate_core::ProviderConfig;

/// Upstream error bodies kept for diagnostics are cut to this many bytes.
const MAX_ERROR_BODY: usize = 1024;

/// Makes single-attempt bearer-authenticated GETs against a resource API.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ResourceClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client for the provider's `api_base_url` with the provider timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, SessionError> {
        let http = http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(http, config.api_base_url.clone()))
    }

    /// GET `path` with the credential as a bearer token and return the JSON body.
    ///
    /// Exactly one request is made. Non-2xx statuses become `UpstreamHttp`.
    pub async fn call_resource(
        &self,
        credential: &DelegatedCredential,
        path: &str,
    ) -> Result<serde_json::Value, SessionError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, timeout = e.is_timeout(), "Downstream call failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %e,
                        timeout = e.is_timeout(),
                        "Failed to read downstream error body"
                    );
                    String::new()
                }
            };
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                "Downstream API returned an error status"
            );
            return Err(SessionError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| match SessionError::from(e) {
                SessionError::Transport(msg) => SessionError::InvalidResponse(msg),
                other => other,
            })
    }
}
