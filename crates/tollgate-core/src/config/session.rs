//! Delegated session configuration.

use super::{ConfigError, MAX_LIFETIME_SECS, resolve_secret};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for provider-backed sessions and their cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds. Also used as the cookie max-age.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Environment variable containing the cookie signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_secret_env: Option<String>,

    /// Path to a file containing the cookie signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_secret_file: Option<PathBuf>,

    /// Inline cookie signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_secret: Option<String>,

    /// Mark the cookie `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookie: bool,

    /// How long an authorization redirect stays valid, in seconds.
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            cookie_name: default_cookie_name(),
            cookie_secret_env: None,
            cookie_secret_file: None,
            cookie_secret: None,
            secure_cookie: false,
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

impl SessionConfig {
    /// Resolve the cookie secret from environment, file, or inline value.
    pub fn resolve_cookie_secret(&self) -> Result<Option<String>, std::io::Error> {
        resolve_secret(
            self.cookie_secret_env.as_deref(),
            self.cookie_secret_file.as_deref(),
            self.cookie_secret.as_deref(),
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == 0 || self.state_ttl_secs == 0 {
            return Err(ConfigError::Config(
                "session lifetimes must be greater than zero".into(),
            ));
        }
        if self.ttl_secs > MAX_LIFETIME_SECS || self.state_ttl_secs > MAX_LIFETIME_SECS {
            return Err(ConfigError::Config(format!(
                "session.ttl_secs and session.state_ttl_secs must be at most {}",
                MAX_LIFETIME_SECS
            )));
        }
        if self.cookie_name.is_empty()
            || self
                .cookie_name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ';' | '=' | ','))
        {
            return Err(ConfigError::Config(format!(
                "session.cookie_name '{}' is not a valid cookie name",
                self.cookie_name
            )));
        }
        if self.cookie_secret.as_deref().is_some_and(|s| s.is_empty()) {
            return Err(ConfigError::Config(
                "session.cookie_secret must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_cookie_name() -> String {
    "tollgate_session".to_string()
}

fn default_state_ttl_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_config() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_secs, 604_800);
        assert_eq!(config.cookie_name, "tollgate_session");
        assert!(!config.secure_cookie);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_cookie_name() {
        let config = SessionConfig {
            cookie_name: "bad name;".into(),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lifetime_upper_bounds() {
        let config = SessionConfig {
            ttl_secs: 1_000_000_000_000_000,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            state_ttl_secs: MAX_LIFETIME_SECS + 1,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            ttl_secs: MAX_LIFETIME_SECS,
            ..SessionConfig::default()
        };
        config.validate().unwrap();
    }
}
