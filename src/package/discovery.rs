use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::forge::PackageRef;
use crate::runtime::Runtime;

/// Find all package checkouts under the install root.
///
/// Directory structure: `<root>/<owner>/<name>/.git`
///
/// Directories without a `.git` entry are not packages and are skipped.
#[tracing::instrument(skip(runtime, root))]
pub fn find_all_packages<R: Runtime>(
    runtime: &R,
    root: &Path,
) -> Result<Vec<(PackageRef, PathBuf)>> {
    let mut packages = Vec::new();

    if !runtime.exists(root) {
        return Ok(packages);
    }

    for owner_path in runtime.read_dir(root)? {
        if !runtime.is_dir(&owner_path) {
            continue;
        }
        let Some(owner) = file_name(&owner_path) else {
            continue;
        };

        for package_path in runtime.read_dir(&owner_path)? {
            if !runtime.is_dir(&package_path) {
                continue;
            }
            let Some(name) = file_name(&package_path) else {
                continue;
            };

            if !runtime.exists(&package_path.join(".git")) {
                debug!("Skipping {:?}: not a git checkout", package_path);
                continue;
            }
            match PackageRef::try_new(&owner, &name) {
                Ok(package) => packages.push((package, package_path)),
                Err(e) => debug!("Skipping {:?}: {}", package_path, e),
            }
        }
    }

    packages.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(packages)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
}
