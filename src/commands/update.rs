use anyhow::Result;

use crate::{forge::PackageRef, runtime::Runtime};

use super::config::Config;
use super::print_report;

/// Update one package, or every outdated package when none is given.
#[tracing::instrument(skip(config))]
pub async fn update<R: Runtime>(config: &Config<R>, package: Option<PackageRef>) -> Result<()> {
    let registry = config.registry();
    let resolver = config.resolver(&registry);

    let report = match &package {
        Some(package) => resolver.update(package).await?,
        None => resolver.update_all().await?,
    };

    if report.changes.is_empty() {
        println!("All packages are up to date.");
        return Ok(());
    }
    print_report(&report, registry.path());
    Ok(())
}
