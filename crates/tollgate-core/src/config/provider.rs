//! External identity provider configuration.
//!
//! Tollgate speaks the OAuth2 authorization-code grant to one provider. The
//! provider issues an opaque access token which is kept server-side and used
//! for downstream calls against `api_base_url`.

use super::{ConfigError, resolve_secret};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the OAuth2 identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Authorization endpoint the user is redirected to.
    pub authorize_url: String,

    /// Token endpoint used for the code exchange.
    pub token_url: String,

    /// Base URL of the provider's resource API.
    pub api_base_url: String,

    /// Path (relative to `api_base_url`) returning the logged-in user.
    #[serde(default = "default_user_info_path")]
    pub user_info_path: String,

    /// OAuth2 client identifier.
    pub client_id: String,

    /// Environment variable containing the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,

    /// Path to a file containing the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_file: Option<PathBuf>,

    /// Inline client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Scope requested from the provider.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Local path the provider redirects back to.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// Timeout for every outbound request (token exchange and downstream calls).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Resolve the client secret from environment, file, or inline value.
    pub fn resolve_client_secret(&self) -> Result<Option<String>, std::io::Error> {
        resolve_secret(
            self.client_secret_env.as_deref(),
            self.client_secret_file.as_deref(),
            self.client_secret.as_deref(),
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::Config(format!(
                    "provider.{} '{}' must be an http(s) URL",
                    field, value
                )));
            }
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Config("provider.client_id must not be empty".into()));
        }
        if !self.callback_path.starts_with('/') {
            return Err(ConfigError::Config(format!(
                "provider.callback_path '{}' must start with '/'",
                self.callback_path
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Config(
                "provider.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_user_info_path() -> String {
    "/users/@me".to_string()
}

fn default_scope() -> String {
    "identify".to_string()
}

fn default_callback_path() -> String {
    "/auth".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let yaml = r#"
authorize_url: https://discord.com/api/oauth2/authorize
token_url: https://discord.com/api/oauth2/token
api_base_url: https://discord.com/api/v9
client_id: "1234"
client_secret: shh
"#;
        let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scope, "identify");
        assert_eq!(config.callback_path, "/auth");
        assert_eq!(config.user_info_path, "/users/@me");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.resolve_client_secret().unwrap().as_deref(), Some("shh"));
        config.validate().unwrap();
    }

    #[test]
    fn test_provider_rejects_non_http_urls() {
        let yaml = r#"
authorize_url: discord.com/authorize
token_url: https://discord.com/api/oauth2/token
api_base_url: https://discord.com/api/v9
client_id: "1234"
"#;
        let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
