use anyhow::Result;
use log::debug;

use crate::runtime::Runtime;

use super::config::Config;

/// Show installed packages with a newer version available.
#[tracing::instrument(skip(config))]
pub async fn updates<R: Runtime>(config: &Config<R>) -> Result<()> {
    let registry = config.registry();
    let outdated = config.resolver(&registry).list_outdated().await?;
    debug!("{} outdated package(s)", outdated.len());

    if outdated.is_empty() {
        println!("All packages are up to date.");
        return Ok(());
    }

    for entry in outdated {
        println!("{} {} -> {}", entry.package, entry.current, entry.latest);
    }
    Ok(())
}
