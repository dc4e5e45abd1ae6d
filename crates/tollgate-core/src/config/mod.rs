//! Configuration types for Tollgate.
//!
//! A deployment is described by one YAML file (conventionally `tollgate.yaml`):
//!
//! - **token**: signing secret and default lifetime for first-party access tokens
//! - **session**: cookie name, cookie secret and lifetime for delegated sessions
//! - **provider**: the external OAuth2 identity provider (optional)
//! - **scopes**: the catalog of scopes that may be granted, with descriptions
//! - **resources**: protected endpoints and the scopes they require
//! - **credentials**: how username/password pairs are checked at `/token`

pub mod credentials;
pub mod provider;
pub mod resource;
pub mod server;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub use credentials::{CredentialMode, CredentialsConfig, UserEntry};
pub use provider::ProviderConfig;
pub use resource::{PolicyKind, ResourceConfig};
pub use server::ServerConfig;
pub use session::SessionConfig;
pub use token::TokenConfig;

/// Routes mounted by the server itself. Configured resources may not shadow them.
pub const RESERVED_PATHS: &[&str] = &[
    "/token",
    "/login",
    "/logout",
    "/healthz",
    "/users/me",
    "/privileged",
];

/// Upper bound for any configured lifetime: ten years.
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Complete Tollgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Application name. Written into the `issuer` claim of every token and
    /// required to match on verification.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// First-party token settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Delegated session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// External identity provider. Delegated login is disabled when absent.
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Declared scopes and their descriptions.
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,

    /// Protected resources keyed by name.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,

    /// Credential checking for the password grant.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            token: TokenConfig::default(),
            session: SessionConfig::default(),
            provider: None,
            server: ServerConfig::default(),
            scopes: BTreeMap::new(),
            resources: BTreeMap::new(),
            credentials: CredentialsConfig::default(),
        }
    }
}

fn default_app_name() -> String {
    "tollgate".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TollgateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve relative secret file paths against the
    /// directory containing the config file, then validate it.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        rebase(&mut config.token.secret_file, &base_dir);
        rebase(&mut config.session.cookie_secret_file, &base_dir);
        if let Some(provider) = config.provider.as_mut() {
            rebase(&mut provider.client_secret_file, &base_dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Config("app_name must not be empty".into()));
        }

        self.token.validate()?;
        self.session.validate()?;
        if let Some(provider) = &self.provider {
            provider.validate()?;
        }

        let mut seen_paths = HashSet::new();
        for (name, resource) in &self.resources {
            if !resource.path.starts_with('/') {
                return Err(ConfigError::Config(format!(
                    "resource '{}': path '{}' must start with '/'",
                    name, resource.path
                )));
            }
            if self.is_reserved_path(&resource.path) {
                return Err(ConfigError::Config(format!(
                    "resource '{}': path '{}' is reserved",
                    name, resource.path
                )));
            }
            if !seen_paths.insert(resource.path.as_str()) {
                return Err(ConfigError::Config(format!(
                    "resource '{}': path '{}' is declared more than once",
                    name, resource.path
                )));
            }
            if !self.scopes.is_empty() {
                if let Some(unknown) = resource
                    .scopes
                    .iter()
                    .find(|s| !self.scopes.contains_key(s.as_str()))
                {
                    return Err(ConfigError::Config(format!(
                        "resource '{}': scope '{}' is not declared in the scope catalog",
                        name, unknown
                    )));
                }
            }
        }

        for (username, user) in &self.credentials.users {
            if let Some(allowed) = &user.allowed_scopes {
                if !self.scopes.is_empty() {
                    if let Some(unknown) =
                        allowed.iter().find(|s| !self.scopes.contains_key(s.as_str()))
                    {
                        return Err(ConfigError::Config(format!(
                            "user '{}': scope '{}' is not declared in the scope catalog",
                            username, unknown
                        )));
                    }
                }
            }
        }

        if self.credentials.mode == CredentialMode::Static && self.credentials.users.is_empty() {
            return Err(ConfigError::Config(
                "credentials.mode is 'static' but no users are configured".into(),
            ));
        }

        Ok(())
    }

    /// Whether a scope may be granted. An empty catalog accepts any scope.
    pub fn is_known_scope(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.contains_key(scope)
    }

    fn is_reserved_path(&self, path: &str) -> bool {
        if RESERVED_PATHS.contains(&path) {
            return true;
        }
        self.provider
            .as_ref()
            .is_some_and(|p| p.callback_path == path)
    }
}

fn rebase(path: &mut Option<PathBuf>, base_dir: &Path) {
    if let Some(p) = path.as_mut() {
        if p.is_relative() {
            *p = base_dir.join(&*p);
        }
    }
}

/// Resolve a secret from an environment variable, a file, or an inline value,
/// in that order of precedence.
pub(crate) fn resolve_secret(
    env: Option<&str>,
    file: Option<&Path>,
    inline: Option<&str>,
) -> Result<Option<String>, std::io::Error> {
    if let Some(env_var) = env {
        if let Ok(value) = std::env::var(env_var) {
            return Ok(Some(value));
        }
    }

    if let Some(path) = file {
        if path.exists() {
            let value = fs::read_to_string(path)?;
            return Ok(Some(value.trim().to_string()));
        }
    }

    Ok(inline.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
app_name: myapp
token:
  secret: "first-party-secret"
session:
  cookie_secret: "cookie-secret"
scopes:
  some.scope: "Some scope"
  other.scope: "Other scope"
  third.scope: "Third scope"
resources:
  endpoint1:
    path: /endpoint1
    scopes: [some.scope, third.scope]
  endpoint2:
    path: /endpoint2
    scopes: [other.scope, third.scope]
    policy: all_of
  endpoint3:
    path: /endpoint3
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = TollgateConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.app_name, "myapp");
        assert_eq!(config.token.default_ttl_secs, 604_800);
        assert_eq!(config.token.algorithm, "HS256");
        assert_eq!(config.resources.len(), 3);
        assert_eq!(config.resources["endpoint2"].policy, PolicyKind::AllOf);
        assert_eq!(config.resources["endpoint1"].policy, PolicyKind::AnyOf);
        assert!(config.resources["endpoint3"].scopes.is_empty());
        assert!(config.provider.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_are_valid_once_secrets_are_present() {
        let mut config = TollgateConfig::default();
        config.token.secret = Some("a".into());
        config.session.cookie_secret = Some("b".into());
        config.validate().unwrap();
        assert_eq!(config.app_name, "tollgate");
    }

    #[test]
    fn test_rejects_unknown_resource_scope() {
        let yaml = format!("{}\n  bad:\n    path: /bad\n    scopes: [missing.scope]\n", SAMPLE);
        let config = TollgateConfig::from_yaml(&yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("missing.scope"));
    }

    #[test]
    fn test_rejects_reserved_and_duplicate_paths() {
        let mut config = TollgateConfig::from_yaml(SAMPLE).unwrap();
        config.resources.insert(
            "shadow".into(),
            ResourceConfig {
                path: "/token".into(),
                ..ResourceConfig::default()
            },
        );
        assert!(config.validate().is_err());

        let mut config = TollgateConfig::from_yaml(SAMPLE).unwrap();
        config.resources.insert(
            "again".into(),
            ResourceConfig {
                path: "/endpoint1".into(),
                ..ResourceConfig::default()
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let yaml = SAMPLE.replace("secret: \"first-party-secret\"", "secret: x\n  algorithm: HS512");
        let config = TollgateConfig::from_yaml(&yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("HS512"));
    }

    #[test]
    fn test_static_mode_requires_users() {
        let mut config = TollgateConfig::from_yaml(SAMPLE).unwrap();
        config.credentials.mode = CredentialMode::Static;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_with_context_rebases_secret_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token.secret"), "from-file\n").unwrap();
        std::fs::write(
            dir.path().join("tollgate.yaml"),
            "token:\n  secret_file: token.secret\nsession:\n  cookie_secret: c\n",
        )
        .unwrap();

        let config = TollgateConfig::load_with_context(dir.path().join("tollgate.yaml")).unwrap();
        assert_eq!(
            config.token.resolve_secret().unwrap().as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn test_known_scope_with_empty_catalog() {
        let config = TollgateConfig::default();
        assert!(config.is_known_scope("anything"));

        let config = TollgateConfig::from_yaml(SAMPLE).unwrap();
        assert!(config.is_known_scope("some.scope"));
        assert!(!config.is_known_scope("admin"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            TollgateConfig::from_yaml(include_str!("../../../../tollgate.example.yaml")).unwrap();
        config.validate().unwrap();
        assert_eq!(
            config.resources["endpoint2"].scopes,
            vec!["other.scope".to_string(), "third.scope".to_string()]
        );
        assert_eq!(
            config.resources["endpoint1"].scopes,
            vec!["some.scope".to_string(), "third.scope".to_string()]
        );
    }

    #[test]
    fn test_rejects_out_of_range_session_lifetime() {
        let mut config = TollgateConfig::default();
        config.session.ttl_secs = 1_000_000_000_000_000;
        assert!(config.validate().is_err());
    }
}
