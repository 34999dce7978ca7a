//! Version control operations on package checkouts.

mod git;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use git::GitClient;

/// Base URL packages are cloned from: `{base}/{owner}/{name}.git`.
pub const DEFAULT_GIT_URL: &str = "https://github.com";

/// Operations the package manager performs on a package checkout.
///
/// Every failed operation is reported as `PackError::RepoOperation` carrying
/// the diagnostic output of the underlying tool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoClient: Send + Sync {
    /// Clone `remote_uri` into `dest` (which must not exist yet).
    async fn clone_repo(&self, dest: &Path, remote_uri: &str) -> Result<()>;

    /// Fetch remote refs and tags without touching the working tree.
    async fn fetch(&self, dir: &Path) -> Result<()>;

    /// Check out `tag` in place.
    async fn checkout(&self, dir: &Path, tag: &str) -> Result<()>;

    /// The tag currently checked out in `dir`.
    async fn current_tag(&self, dir: &Path) -> Result<String>;
}
