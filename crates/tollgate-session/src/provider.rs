//! External OAuth2 identity provider.

use crate::error::SessionError;
use crate::record::DelegatedCredential;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tollgate_core::ProviderConfig;
use url::Url;

/// The two calls Tollgate makes to an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the user agent is sent to for authorization.
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, SessionError>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<DelegatedCredential, SessionError>;
}

/// Build an HTTP client with a hard per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SessionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SessionError::Transport(e.to_string()))
}

/// Raw JSON response from an OAuth token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_credential(self) -> DelegatedCredential {
        let expires_at = self
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl));

        DelegatedCredential {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            scope: self.scope,
            expires_at,
        }
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// RFC 6749 section 5.2 error body.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization-code grant against a configured provider.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    http: reqwest::Client,
    authorize_url: String,
    token_url: String,
    client_id: String,
    client_secret: Option<String>,
    scope: String,
}

impl OAuthProvider {
    pub fn new(
        http: reqwest::Client,
        config: &ProviderConfig,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret,
            scope: config.scope.clone(),
        }
    }

    /// Resolve the client secret and build a client with the configured timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, SessionError> {
        let secret = config
            .resolve_client_secret()
            .map_err(|e| SessionError::Transport(format!("failed to read client secret: {e}")))?;
        let http = http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(http, config, secret))
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, SessionError> {
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", self.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| SessionError::InvalidResponse(format!("bad authorize_url: {e}")))?;
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<DelegatedCredential, SessionError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let resp = self.http.post(&self.token_url).form(&params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // Some providers report failures with 200 and an `error` field.
        if let Ok(err) = serde_json::from_str::<OAuthErrorBody>(&body) {
            tracing::warn!(
                status = status.as_u16(),
                error = %err.error,
                "Identity provider rejected code exchange"
            );
            return Err(SessionError::UpstreamAuth {
                error: err.error,
                description: err.error_description,
            });
        }

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token endpoint returned an error status");
            return Err(SessionError::UpstreamAuth {
                error: format!("token endpoint returned {status}"),
                description: (!body.is_empty()).then_some(body),
            });
        }

        let raw: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SessionError::InvalidResponse(format!("failed to parse token response: {e}")))?;
        Ok(raw.into_credential())
    }
}
