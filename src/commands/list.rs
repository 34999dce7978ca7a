use anyhow::Result;
use log::debug;

use crate::runtime::Runtime;

use super::config::Config;

/// List all installed packages
#[tracing::instrument(skip(config))]
pub async fn list<R: Runtime>(config: &Config<R>) -> Result<()> {
    debug!("Listing packages from {:?}", config.install_root);

    let installed = config.store().list_installed().await?;
    if installed.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    for package in installed {
        println!("{} {}", package.package, package.version);
    }
    Ok(())
}
