//! First-party token configuration.

use super::{ConfigError, MAX_LIFETIME_SECS, resolve_secret};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The only signing algorithm Tollgate accepts.
pub const SUPPORTED_ALGORITHM: &str = "HS256";

/// Configuration for self-issued access tokens.
///
/// The signing secret is resolved in this order:
/// 1. `secret_env` - environment variable holding the secret
/// 2. `secret_file` - file containing the secret
/// 3. `secret` - inline value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable containing the signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,

    /// Path to a file containing the signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<PathBuf>,

    /// Inline signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Signing algorithm. Must be `HS256`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Lifetime of issued tokens when the caller does not ask for one.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_env: None,
            secret_file: None,
            secret: None,
            algorithm: default_algorithm(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl TokenConfig {
    /// Resolve the signing secret from environment, file, or inline value.
    pub fn resolve_secret(&self) -> Result<Option<String>, std::io::Error> {
        resolve_secret(
            self.secret_env.as_deref(),
            self.secret_file.as_deref(),
            self.secret.as_deref(),
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.algorithm != SUPPORTED_ALGORITHM {
            return Err(ConfigError::Config(format!(
                "token.algorithm '{}' is not supported (only {} is accepted)",
                self.algorithm, SUPPORTED_ALGORITHM
            )));
        }
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::Config(
                "token.default_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.default_ttl_secs > MAX_LIFETIME_SECS {
            return Err(ConfigError::Config(format!(
                "token.default_ttl_secs must be at most {}",
                MAX_LIFETIME_SECS
            )));
        }
        if self.secret.as_deref().is_some_and(|s| s.is_empty()) {
            return Err(ConfigError::Config("token.secret must not be empty".into()));
        }
        Ok(())
    }
}

fn default_algorithm() -> String {
    SUPPORTED_ALGORITHM.to_string()
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}
