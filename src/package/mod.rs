//! Package management module
//!
//! This module provides abstractions for the set of installed packages,
//! their manifests, and version tag handling.

mod discovery;
mod manifest;
mod store;
mod version;

pub use discovery::find_all_packages;
pub use manifest::{DependencyRef, MANIFEST_FILE, Manifest};
pub use store::{InstalledPackage, PackageStore};
pub use version::{TaggedVersion, Version, VersionParseError, VersionRequest, VersionResolver};
