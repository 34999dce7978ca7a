//! Store of installed packages.
//!
//! Every installed package is a git checkout at `<install_root>/<owner>/<name>`.
//! Nothing else is recorded on disk: the installed version is whatever tag the
//! checkout currently sits on.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::error::PackError;
use crate::forge::PackageRef;
use crate::runtime::Runtime;
use crate::vcs::RepoClient;

use super::{DependencyRef, Manifest, Version, find_all_packages};

/// A package checkout whose current tag parses as a version.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPackage {
    pub package: PackageRef,
    pub dir: PathBuf,
    pub version: Version,
}

pub struct PackageStore<'a, R: Runtime> {
    runtime: &'a R,
    repo_client: &'a dyn RepoClient,
    install_root: PathBuf,
}

impl<'a, R: Runtime> PackageStore<'a, R> {
    pub fn new(runtime: &'a R, repo_client: &'a dyn RepoClient, install_root: PathBuf) -> Self {
        Self {
            runtime,
            repo_client,
            install_root,
        }
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    pub fn repo_client(&self) -> &'a dyn RepoClient {
        self.repo_client
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Returns: `<install_root>/<owner>`
    pub fn owner_dir(&self, package: &PackageRef) -> PathBuf {
        self.install_root.join(&package.owner)
    }

    /// Returns: `<install_root>/<owner>/<name>`
    pub fn package_dir(&self, package: &PackageRef) -> PathBuf {
        self.owner_dir(package).join(&package.name)
    }

    /// A package is installed when its directory exists.
    pub fn is_installed(&self, package: &PackageRef) -> bool {
        self.runtime.is_dir(&self.package_dir(package))
    }

    /// The directory of an installed package.
    pub fn directory_for(&self, package: &PackageRef) -> Result<PathBuf> {
        if self.is_installed(package) {
            Ok(self.package_dir(package))
        } else {
            Err(PackError::NotInstalled(package.clone()).into())
        }
    }

    /// The version checked out in `dir`.
    ///
    /// Returns `None` when git cannot name the current tag or the tag is not
    /// a version.
    pub async fn current_version(&self, dir: &Path) -> Option<Version> {
        let tag = match self.repo_client.current_tag(dir).await {
            Ok(tag) => tag,
            Err(e) => {
                warn!("Cannot read current tag of {:?}: {}", dir, e);
                return None;
            }
        };
        match tag.parse::<Version>() {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("Ignoring {:?}: {}", dir, e);
                None
            }
        }
    }

    /// Look up one installed package.
    pub async fn find(&self, package: &PackageRef) -> Option<InstalledPackage> {
        if !self.is_installed(package) {
            return None;
        }
        let dir = self.package_dir(package);
        let version = self.current_version(&dir).await?;
        Some(InstalledPackage {
            package: package.clone(),
            dir,
            version,
        })
    }

    /// All installed packages with a readable version, sorted by owner/name.
    #[tracing::instrument(skip(self))]
    pub async fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let found = find_all_packages(self.runtime, &self.install_root)?;
        debug!("Found {} package checkout(s)", found.len());

        let mut installed = Vec::with_capacity(found.len());
        for (package, dir) in found {
            if let Some(version) = self.current_version(&dir).await {
                installed.push(InstalledPackage {
                    package,
                    dir,
                    version,
                });
            }
        }
        Ok(installed)
    }

    /// Dependencies declared by the package in `dir`.
    pub fn dependencies_of(&self, dir: &Path) -> Result<Vec<DependencyRef>> {
        Ok(Manifest::load(self.runtime, dir)?.dependencies)
    }

    /// Delete an installed package. Its dependencies stay installed.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, package: &PackageRef) -> Result<()> {
        let dir = self.directory_for(package)?;
        debug!("Removing package directory {:?}", dir);
        self.runtime
            .remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", package))?;

        // Try to remove empty owner directory
        let owner_dir = self.owner_dir(package);
        if let Ok(entries) = self.runtime.read_dir(&owner_dir)
            && entries.is_empty()
        {
            let _ = self.runtime.remove_dir(&owner_dir);
        }

        Ok(())
    }
}
