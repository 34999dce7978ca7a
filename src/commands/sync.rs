use anyhow::Result;

use crate::runtime::Runtime;

use super::config::Config;

/// Republish the search path from what is on disk.
#[tracing::instrument(skip(config))]
pub async fn sync<R: Runtime>(config: &Config<R>) -> Result<()> {
    let registry = config.registry();
    let entries = config.resolver(&registry).sync().await?;

    for entry in &entries {
        println!("{} {}", entry.kind, entry.dir.display());
    }
    println!(
        "Wrote {} search path(s) to {}",
        entries.len(),
        registry.path().display()
    );
    Ok(())
}
