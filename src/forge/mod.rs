//! Forge abstraction for tag discovery.
//!
//! A forge hosts package repositories; the only thing the package manager
//! asks of it is the list of tags of a repository.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub use github::{DEFAULT_API_URL, GitHubForge};

/// Identifies a hosted repository (owner/name); the install key of a package.
///
/// Both parts become path components under the install root and segments of
/// forge URLs, so they are restricted to `[A-Za-z0-9._-]` and may not be `.`
/// or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "RawPackageRef")]
pub struct PackageRef {
    pub owner: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawPackageRef {
    #[serde(alias = "user")]
    owner: String,
    #[serde(alias = "repo")]
    name: String,
}

/// An owner or name that cannot be used as a package coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPackageRef(pub String);

impl fmt::Display for InvalidPackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid package owner or name '{}'. Use letters, digits, '.', '_' or '-'.",
            self.0
        )
    }
}

impl std::error::Error for InvalidPackageRef {}

/// Check one owner or name segment.
pub fn validate_segment(segment: &str) -> Result<&str, InvalidPackageRef> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if segment.is_empty() || segment == "." || segment == ".." || !segment.chars().all(allowed) {
        return Err(InvalidPackageRef(segment.to_string()));
    }
    Ok(segment)
}

impl PackageRef {
    /// Build without validation; for coordinates already known to be valid.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn try_new(owner: &str, name: &str) -> Result<Self, InvalidPackageRef> {
        Ok(Self::new(validate_segment(owner)?, validate_segment(name)?))
    }
}

impl TryFrom<RawPackageRef> for PackageRef {
    type Error = InvalidPackageRef;

    fn try_from(raw: RawPackageRef) -> Result<Self, Self::Error> {
        Self::try_new(&raw.owner, &raw.name)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for PackageRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) => Ok(PackageRef::try_new(owner, name)?),
            None => anyhow::bail!("Invalid package format. Expected 'owner/name'."),
        }
    }
}

/// Trait for code forges (GitHub, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Fetch the raw names of all tags of a repository.
    async fn list_tags(&self, package: &PackageRef) -> Result<Vec<String>>;
}
