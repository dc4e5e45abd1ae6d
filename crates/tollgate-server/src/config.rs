use anyhow::Context;
use std::{env, path::PathBuf};
use tollgate_core::TollgateConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TOLLGATE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "tollgate.yaml";

/// Path of the configuration file: `$TOLLGATE_CONFIG` or `./tollgate.yaml`.
pub fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate the server configuration.
pub fn load_config() -> anyhow::Result<TollgateConfig> {
    let path = config_path();
    TollgateConfig::load_with_context(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}
