use anyhow::Result;
use log::info;

use crate::{forge::PackageRef, runtime::Runtime};

use super::config::Config;

/// Remove a package. Packages it depends on stay installed.
#[tracing::instrument(skip(config))]
pub async fn remove<R: Runtime>(config: &Config<R>, package: &PackageRef) -> Result<()> {
    let registry = config.registry();
    let entries = config.resolver(&registry).remove(package).await?;
    info!("{} search path(s) remain", entries.len());
    println!("Removed {}", package);
    Ok(())
}
