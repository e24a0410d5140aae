//! Static host command.

use std::path::Path;

use anyhow::Result;
use remu_server::{ServeOptions, Server, ServerConfig};

/// Run the serve command.
pub async fn run(config_path: &Path, listen: Option<String>, watch: bool, open: bool) -> Result<()> {
    let mut config = ServerConfig::load(config_path)?;
    if let Some(listen) = listen {
        config.listen = listen;
    }

    tracing::info!("Starting static host on {}", config.listen);

    Server::new(config, ServeOptions { watch, open }).start().await?;

    Ok(())
}
