//! CLI command implementations.

pub mod check;
pub mod credentials;
pub mod secret;
pub mod serve;
pub mod token;

use anyhow::Context;
use std::fs;
use std::path::Path;
use tollgate_core::TollgateConfig;
use tollgate_token::SigningSecret;

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<TollgateConfig> {
    TollgateConfig::load_with_context(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Resolve the token signing secret named by the configuration.
pub fn signing_secret(config: &TollgateConfig) -> anyhow::Result<SigningSecret> {
    let value = config
        .token
        .resolve_secret()
        .context("Failed to read token signing secret")?
        .context("No token signing secret configured. Set token.secret_env, token.secret_file or token.secret")?;
    SigningSecret::new(value).context("Invalid token signing secret")
}

/// Accept either a literal token or a path to a file holding one.
fn read_token_arg(token: String) -> anyhow::Result<String> {
    let path = Path::new(&token);
    if path.is_file() {
        return Ok(fs::read_to_string(path)
            .with_context(|| format!("Failed to read token from {}", path.display()))?
            .trim()
            .to_string());
    }
    Ok(token.trim().to_string())
}
