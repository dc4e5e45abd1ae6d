//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:8000`.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Externally reachable base URL, used to build the provider redirect URI.
    /// Defaults to `http://{bind}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Include the provider's error text in 500 responses for failed logins.
    /// The text is always logged regardless of this setting.
    #[serde(default = "default_true")]
    pub expose_upstream_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: None,
            expose_upstream_errors: true,
        }
    }
}

impl ServerConfig {
    /// Base URL for absolute links, without a trailing slash.
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_base_url() {
        let mut config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://127.0.0.1:8000");

        config.public_url = Some("https://gate.example.com/".into());
        assert_eq!(config.public_base_url(), "https://gate.example.com");
    }
}
