//! Package manifest (`pack.json`).
//!
//! ```json
//! {
//!   "name": "foo",
//!   "dependencies": [
//!     { "user": "bob", "repo": "bar" }
//!   ]
//! }
//! ```
//!
//! Dependencies name their owner with `user` or `owner` and the repository
//! with `repo` or `name`; both must be valid package coordinates. Fields other
//! than `dependencies` are ignored.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::PackError;
use crate::forge::PackageRef;
use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "pack.json";

/// A package listed as a dependency; always resolved to its latest version.
pub type DependencyRef = PackageRef;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl Manifest {
    /// Path of the manifest inside a package directory.
    pub fn path_in(package_dir: &Path) -> PathBuf {
        package_dir.join(MANIFEST_FILE)
    }

    /// Parse manifest text; `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let manifest: Manifest =
            serde_json::from_str(content).map_err(|e| PackError::Manifest {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(manifest)
    }

    /// Load the manifest of a package; a package without one has no dependencies.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, package_dir: &Path) -> Result<Self> {
        let path = Self::path_in(package_dir);
        if !runtime.exists(&path) {
            return Ok(Self::default());
        }
        let content = runtime.read_to_string(&path)?;
        Self::parse(&content, &path)
    }
}
