//! Resolver - installs and updates packages together with their dependencies.
//!
//! One top-level operation walks the dependency graph depth first. Each
//! package is handled at most once per walk, so shared and cyclic
//! dependencies terminate. Nothing is rolled back: packages installed before
//! a failure stay installed, and the search path is resynchronized with
//! whatever is on disk before the failure is reported.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::error::PackError;
use crate::forge::{Forge, PackageRef};
use crate::package::{
    InstalledPackage, PackageStore, TaggedVersion, Version, VersionRequest, VersionResolver,
};
use crate::runtime::Runtime;
use crate::search_path::{SearchPathEntry, Synchronizer};
use crate::vcs::DEFAULT_GIT_URL;

type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Why a package was visited; only affects reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Package,
    Dependency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed { version: Version },
    Updated { from: Option<Version>, to: Version },
    UpToDate { version: Version },
}

/// What happened to one package during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub package: PackageRef,
    pub role: Role,
    pub outcome: Outcome,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.role {
            Role::Package => "package",
            Role::Dependency => "dependency",
        };
        match &self.outcome {
            Outcome::Installed { version } => {
                write!(f, "Installed {} {} {}", kind, self.package, version)
            }
            Outcome::Updated {
                from: Some(from),
                to,
            } => write!(f, "Updated {} {} {} -> {}", kind, self.package, from, to),
            Outcome::Updated { from: None, to } => {
                write!(f, "Updated {} {} to {}", kind, self.package, to)
            }
            Outcome::UpToDate { version } => write!(
                f,
                "{} {} is up to date ({}), no need to update",
                kind, self.package, version
            ),
        }
    }
}

/// Result of a mutating operation.
#[derive(Debug, Default)]
pub struct Report {
    pub changes: Vec<Change>,
    /// Search path as published by the closing sync
    pub search_paths: Vec<SearchPathEntry>,
}

/// An installed package with a newer (or at least different) latest tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outdated {
    pub package: PackageRef,
    pub current: Version,
    pub latest: Version,
}

#[derive(Default)]
struct Walk {
    visited: HashSet<PackageRef>,
    changes: Vec<Change>,
}

pub struct Resolver<'a, R: Runtime> {
    store: PackageStore<'a, R>,
    forge: &'a dyn Forge,
    synchronizer: Synchronizer<'a, R>,
    git_url: String,
}

impl<'a, R: Runtime> Resolver<'a, R> {
    pub fn new(
        store: PackageStore<'a, R>,
        forge: &'a dyn Forge,
        synchronizer: Synchronizer<'a, R>,
    ) -> Self {
        Self {
            store,
            forge,
            synchronizer,
            git_url: DEFAULT_GIT_URL.to_string(),
        }
    }

    /// Clone packages from `{git_url}/{owner}/{name}.git`.
    pub fn with_git_url(mut self, git_url: &str) -> Self {
        self.git_url = git_url.trim_end_matches('/').to_string();
        self
    }

    pub fn store(&self) -> &PackageStore<'a, R> {
        &self.store
    }

    pub fn remote_uri(&self, package: &PackageRef) -> String {
        format!("{}/{}/{}.git", self.git_url, package.owner, package.name)
    }

    /// Install a package and its dependencies.
    ///
    /// An already installed package is updated instead.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, package: &PackageRef, request: VersionRequest) -> Result<Report> {
        let mut walk = Walk::default();
        let result = self
            .resolve(package, request, Role::Package, &mut walk)
            .await;
        self.finish(walk, result).await
    }

    /// Move an installed package to its latest version and resolve its dependencies.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, package: &PackageRef) -> Result<Report> {
        self.store.directory_for(package)?;
        let mut walk = Walk::default();
        let result = self
            .resolve(package, VersionRequest::Latest, Role::Package, &mut walk)
            .await;
        self.finish(walk, result).await
    }

    /// Installed packages whose current version differs from the latest tag.
    ///
    /// Only fetches; no checkout is moved.
    #[tracing::instrument(skip(self))]
    pub async fn list_outdated(&self) -> Result<Vec<Outdated>> {
        let mut outdated = Vec::new();
        for installed in self.store.list_installed().await? {
            if let Some(entry) = self.check_outdated(&installed).await? {
                outdated.push(entry);
            }
        }
        Ok(outdated)
    }

    /// Update every outdated package.
    ///
    /// A failing package does not stop the others. The first failure is
    /// returned once every package has been tried.
    #[tracing::instrument(skip(self))]
    pub async fn update_all(&self) -> Result<Report> {
        let outdated = self.list_outdated().await?;
        debug!("{} package(s) to update", outdated.len());

        let mut walk = Walk::default();
        let mut failures: Vec<(&PackageRef, anyhow::Error)> = Vec::new();
        for entry in &outdated {
            // Removed since the outdated list was computed
            let updated = match self.store.directory_for(&entry.package) {
                Ok(_) => {
                    self.resolve(&entry.package, VersionRequest::Latest, Role::Package, &mut walk)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = updated {
                warn!("Failed to update {}: {:#}", entry.package, e);
                failures.push((&entry.package, e));
            }
        }

        let result = if failures.is_empty() {
            Ok(())
        } else {
            let names: Vec<String> = failures.iter().map(|(p, _)| p.to_string()).collect();
            let summary = format!(
                "Failed to update {} of {} package(s): {}",
                failures.len(),
                outdated.len(),
                names.join(", ")
            );
            let (_, first) = failures.swap_remove(0);
            Err(first.context(summary))
        };
        self.finish(walk, result).await
    }

    /// Remove a package (never its dependencies) and resynchronize.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, package: &PackageRef) -> Result<Vec<SearchPathEntry>> {
        self.store.remove(package)?;
        self.sync().await
    }

    /// Republish the search path from the packages on disk.
    pub async fn sync(&self) -> Result<Vec<SearchPathEntry>> {
        self.synchronizer
            .sync(&self.store)
            .await
            .context("Failed to synchronize search paths")
    }

    async fn finish(&self, walk: Walk, result: Result<()>) -> Result<Report> {
        let synced = self.sync().await;
        if let Err(e) = result {
            for change in &walk.changes {
                info!("Completed before failure: {}", change);
            }
            return Err(e);
        }
        Ok(Report {
            changes: walk.changes,
            search_paths: synced?,
        })
    }

    fn resolve<'s>(
        &'s self,
        package: &'s PackageRef,
        request: VersionRequest,
        role: Role,
        walk: &'s mut Walk,
    ) -> LocalBoxFuture<'s, Result<()>> {
        Box::pin(async move {
            if !walk.visited.insert(package.clone()) {
                debug!("{} already handled in this run", package);
                return Ok(());
            }

            let change = if self.store.is_installed(package) {
                if let VersionRequest::Exact(version) = request {
                    warn!(
                        "{} is already installed; updating to latest instead of {}",
                        package, version
                    );
                }
                self.update_checkout(package, role).await?
            } else {
                self.install_checkout(package, request, role).await?
            };
            info!("{}", change);
            walk.changes.push(change);

            let dir = self.store.package_dir(package);
            let dependencies = self
                .store
                .dependencies_of(&dir)
                .with_context(|| format!("Failed to resolve dependencies of {}", package))?;
            for dependency in &dependencies {
                self.resolve(dependency, VersionRequest::Latest, Role::Dependency, walk)
                    .await
                    .with_context(|| {
                        format!("Failed to install dependency {} of {}", dependency, package)
                    })?;
            }
            Ok(())
        })
    }

    async fn install_checkout(
        &self,
        package: &PackageRef,
        request: VersionRequest,
        role: Role,
    ) -> Result<Change> {
        let chosen = self.select_version(package, request).await?;

        let runtime = self.store.runtime();
        let owner_dir = self.store.owner_dir(package);
        if !runtime.exists(&owner_dir) {
            runtime.create_dir_all(&owner_dir)?;
        }

        let dir = self.store.package_dir(package);
        let uri = self.remote_uri(package);
        debug!("Cloning {} into {:?}", uri, dir);
        let git = self.store.repo_client();
        git.clone_repo(&dir, &uri)
            .await
            .with_context(|| format!("Failed to clone {}", package))?;
        git.checkout(&dir, &chosen.tag)
            .await
            .with_context(|| format!("Failed to check out {} {}", package, chosen.tag))?;

        Ok(Change {
            package: package.clone(),
            role,
            outcome: Outcome::Installed {
                version: chosen.version,
            },
        })
    }

    async fn update_checkout(&self, package: &PackageRef, role: Role) -> Result<Change> {
        let dir = self.store.directory_for(package)?;
        let git = self.store.repo_client();
        git.fetch(&dir)
            .await
            .with_context(|| format!("Failed to fetch {}", package))?;

        let current = self.store.current_version(&dir).await;
        let latest = self.latest(package).await?;

        let outcome = match current {
            Some(version) if version == latest.version => Outcome::UpToDate { version },
            _ => {
                git.checkout(&dir, &latest.tag)
                    .await
                    .with_context(|| format!("Failed to check out {} {}", package, latest.tag))?;
                Outcome::Updated {
                    from: current,
                    to: latest.version,
                }
            }
        };

        Ok(Change {
            package: package.clone(),
            role,
            outcome,
        })
    }

    async fn check_outdated(&self, installed: &InstalledPackage) -> Result<Option<Outdated>> {
        self.store
            .repo_client()
            .fetch(&installed.dir)
            .await
            .with_context(|| format!("Failed to fetch {}", installed.package))?;

        let tags = self.list_tags(&installed.package).await?;
        let Some(latest) = VersionResolver::latest(&tags) else {
            warn!("No version tag found for {}", installed.package);
            return Ok(None);
        };

        Ok((latest.version != installed.version).then(|| Outdated {
            package: installed.package.clone(),
            current: installed.version,
            latest: latest.version,
        }))
    }

    async fn list_tags(&self, package: &PackageRef) -> Result<Vec<String>> {
        self.forge
            .list_tags(package)
            .await
            .with_context(|| format!("Failed to list tags of {}", package))
    }

    async fn latest(&self, package: &PackageRef) -> Result<TaggedVersion> {
        self.select_version(package, VersionRequest::Latest).await
    }

    async fn select_version(
        &self,
        package: &PackageRef,
        request: VersionRequest,
    ) -> Result<TaggedVersion> {
        let tags = self.list_tags(package).await?;
        let version = match request {
            VersionRequest::Latest => {
                return VersionResolver::latest(&tags)
                    .ok_or_else(|| PackError::NoVersionTag(package.clone()).into());
            }
            VersionRequest::Exact(version) => version,
        };
        if let Some(found) = VersionResolver::find_exact(&tags, version) {
            return Ok(found);
        }

        let available: Vec<Version> = VersionResolver::parse_tags(&tags)
            .iter()
            .map(|t| t.version)
            .collect();
        if available.is_empty() {
            return Err(PackError::NoVersionTag(package.clone()).into());
        }
        Err(PackError::VersionNotFound {
            package: package.clone(),
            version,
            available,
        }
        .into())
    }
}
