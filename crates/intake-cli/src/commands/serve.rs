//! The `intake serve` command.

use std::path::PathBuf;

use anyhow::Result;

use intake_stores::config::load_config_from;

pub async fn execute(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(bind_addr) = bind {
        config.server.bind_addr = bind_addr;
    }
    if config.server.admin_secret.is_empty() {
        eprintln!("Warning: no admin secret configured; the admin surface is disabled.");
    }
    intake_server::run(config).await
}
