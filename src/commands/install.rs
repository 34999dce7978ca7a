use anyhow::{Context, Result};

use crate::{
    forge::PackageRef,
    package::{Version, VersionRequest},
    runtime::Runtime,
};

use super::config::Config;
use super::print_report;

/// Install a package, optionally pinned to a version.
#[tracing::instrument(skip(config))]
pub async fn install<R: Runtime>(
    config: &Config<R>,
    owner: &str,
    name: &str,
    version: Option<&str>,
) -> Result<()> {
    let package = PackageRef::try_new(owner, name)?;
    let request = match version {
        Some(v) => VersionRequest::Exact(parse_version_arg(v)?),
        None => VersionRequest::Latest,
    };

    let registry = config.registry();
    let report = config.resolver(&registry).install(&package, request).await?;
    print_report(&report, registry.path());
    Ok(())
}

/// Accepts `V1.2.3` as well as a bare `1.2.3`.
pub(crate) fn parse_version_arg(arg: &str) -> Result<Version> {
    let tag = if arg.starts_with('V') {
        arg.to_string()
    } else {
        format!("V{}", arg)
    };
    tag.parse::<Version>()
        .with_context(|| format!("Invalid version '{}'", arg))
}
