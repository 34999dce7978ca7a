//! Failure taxonomy of package operations.
//!
//! These errors travel inside `anyhow::Error`; callers that need to react to a
//! specific failure use `downcast_ref::<PackError>()`.

use std::fmt;
use std::path::PathBuf;

use crate::forge::PackageRef;
use crate::package::Version;

#[derive(Debug)]
pub enum PackError {
    /// A pinned version is not among the forge's version tags
    VersionNotFound {
        package: PackageRef,
        version: Version,
        available: Vec<Version>,
    },
    /// The forge lists no tag that parses as a version
    NoVersionTag(PackageRef),
    /// Update/remove of a package that has no install directory
    NotInstalled(PackageRef),
    /// Network or authentication failure talking to the forge
    ForgeUnavailable(String),
    /// A git subprocess exited unsuccessfully
    RepoOperation { operation: String, stderr: String },
    /// A package manifest could not be read as a dependency list
    Manifest { path: PathBuf, reason: String },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::VersionNotFound {
                package,
                version,
                available,
            } => {
                write!(f, "Version {} not found for {}.", version, package)?;
                if available.is_empty() {
                    Ok(())
                } else {
                    let listed = available
                        .iter()
                        .rev()
                        .take(5)
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, " Available versions: {}", listed)
                }
            }
            PackError::NoVersionTag(package) => {
                write!(f, "No version tag found for {}.", package)
            }
            PackError::NotInstalled(package) => {
                write!(f, "Package {} is not installed.", package)
            }
            PackError::ForgeUnavailable(msg) => write!(f, "Forge unavailable: {}", msg),
            PackError::RepoOperation { operation, stderr } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    write!(f, "{} failed", operation)
                } else {
                    write!(f, "{} failed: {}", operation, stderr)
                }
            }
            PackError::Manifest { path, reason } => {
                write!(f, "Invalid manifest {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for PackError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> PackageRef {
        PackageRef::new("alice", "foo")
    }

    #[test]
    fn test_version_not_found_lists_newest_first() {
        let err = PackError::VersionNotFound {
            package: foo(),
            version: Version::new(9, 0, 0),
            available: vec![Version::new(1, 0, 0), Version::new(1, 2, 0)],
        };
        assert_eq!(
            err.to_string(),
            "Version V9.0.0 not found for alice/foo. Available versions: V1.2.0, V1.0.0"
        );
    }

    #[test]
    fn test_version_not_found_without_candidates() {
        let err = PackError::VersionNotFound {
            package: foo(),
            version: Version::new(1, 0, 0),
            available: vec![],
        };
        assert_eq!(err.to_string(), "Version V1.0.0 not found for alice/foo.");
    }

    #[test]
    fn test_repo_operation_display() {
        let err = PackError::RepoOperation {
            operation: "git fetch".into(),
            stderr: "fatal: unable to access\n".into(),
        };
        assert_eq!(err.to_string(), "git fetch failed: fatal: unable to access");

        let silent = PackError::RepoOperation {
            operation: "git checkout V1.0.0".into(),
            stderr: "   ".into(),
        };
        assert_eq!(silent.to_string(), "git checkout V1.0.0 failed");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = PackError::NotInstalled(foo()).into();
        let err = err.context("Failed to update alice/foo");
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::NotInstalled(_))
        ));
    }
}
