//! `tollgate serve`: run the HTTP server.

use std::path::Path;

pub async fn run(config_path: &Path, bind: Option<String>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    tracing::info!(config = %config_path.display(), "Starting tollgate");
    tollgate_server::run(config).await
}
