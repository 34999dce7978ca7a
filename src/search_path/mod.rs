//! Runtime search-path synchronization.
//!
//! After every change to the installed package set, the search path is
//! recomputed from the packages on disk and republished as a whole:
//!
//! - `<package>/prolog` becomes a module (`library`) directory
//! - `<package>/lib/<arch>-<os>` becomes a native library (`foreign`) directory
//!
//! Only directories that exist are published.

mod registry;

use anyhow::Result;
use log::debug;
use std::fmt;
use std::path::PathBuf;

use crate::package::{InstalledPackage, PackageStore};
use crate::platform::Platform;
use crate::runtime::Runtime;

pub use registry::{
    FileRegistry, MemoryRegistry, SEARCH_PATHS_FILE, SearchPathRegistry, render_prolog,
};

#[cfg(test)]
pub use registry::MockSearchPathRegistry;

/// Module sources directory inside a package.
pub const MODULE_DIR: &str = "prolog";
/// Native libraries directory inside a package.
pub const NATIVE_LIB_DIR: &str = "lib";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchPathKind {
    Module,
    NativeLibrary,
}

impl SearchPathKind {
    /// The `file_search_path/2` alias the runtime resolves this kind through.
    pub fn alias(&self) -> &'static str {
        match self {
            SearchPathKind::Module => "library",
            SearchPathKind::NativeLibrary => "foreign",
        }
    }
}

impl fmt::Display for SearchPathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPathEntry {
    pub kind: SearchPathKind,
    pub dir: PathBuf,
}

pub struct Synchronizer<'a, R: Runtime> {
    runtime: &'a R,
    registry: &'a dyn SearchPathRegistry,
    platform_tag: String,
}

impl<'a, R: Runtime> Synchronizer<'a, R> {
    pub fn new(runtime: &'a R, registry: &'a dyn SearchPathRegistry, platform: &Platform) -> Self {
        Self {
            runtime,
            registry,
            platform_tag: platform.tag(),
        }
    }

    /// Candidate directories of a package, whether or not they exist.
    pub fn candidates(&self, installed: &InstalledPackage) -> [SearchPathEntry; 2] {
        [
            SearchPathEntry {
                kind: SearchPathKind::Module,
                dir: installed.dir.join(MODULE_DIR),
            },
            SearchPathEntry {
                kind: SearchPathKind::NativeLibrary,
                dir: installed.dir.join(NATIVE_LIB_DIR).join(&self.platform_tag),
            },
        ]
    }

    /// Existing search-path directories for a set of packages.
    pub fn compute(&self, packages: &[InstalledPackage]) -> Vec<SearchPathEntry> {
        packages
            .iter()
            .flat_map(|p| self.candidates(p))
            .filter(|entry| self.runtime.is_dir(&entry.dir))
            .collect()
    }

    /// Rebuild the registry from the packages currently on disk.
    #[tracing::instrument(skip(self, store))]
    pub async fn sync(&self, store: &PackageStore<'_, R>) -> Result<Vec<SearchPathEntry>> {
        let packages = store.list_installed().await?;
        let entries = self.compute(&packages);
        debug!(
            "Publishing {} search path(s) for {} package(s)",
            entries.len(),
            packages.len()
        );
        self.registry.publish(&entries)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::PackageRef;
    use crate::package::Version;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::vcs::MockRepoClient;
    use mockall::predicate::eq;
    use std::path::Path;

    fn linux() -> Platform {
        Platform {
            os: "linux".into(),
            arch: "x86_64".into(),
        }
    }

    fn installed(owner: &str, name: &str, dir: &Path) -> InstalledPackage {
        InstalledPackage {
            package: PackageRef::new(owner, name),
            dir: dir.to_path_buf(),
            version: Version::new(1, 0, 0),
        }
    }

    #[test]
    fn test_candidates() {
        let runtime = MockRuntime::new();
        let registry = MemoryRegistry::new();
        let sync = Synchronizer::new(&runtime, &registry, &linux());

        let [module, native] = sync.candidates(&installed("alice", "foo", Path::new("/r/alice/foo")));
        assert_eq!(module.kind, SearchPathKind::Module);
        assert_eq!(module.dir, PathBuf::from("/r/alice/foo/prolog"));
        assert_eq!(native.kind, SearchPathKind::NativeLibrary);
        assert_eq!(native.dir, PathBuf::from("/r/alice/foo/lib/x86_64-linux"));
    }

    #[test]
    fn test_compute_keeps_existing_directories_only() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/r/alice/foo/prolog")))
            .returning(|_| true);
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/r/alice/foo/lib/x86_64-linux")))
            .returning(|_| false);
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/r/bob/bar/prolog")))
            .returning(|_| false);
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/r/bob/bar/lib/x86_64-linux")))
            .returning(|_| true);

        let registry = MemoryRegistry::new();
        let sync = Synchronizer::new(&runtime, &registry, &linux());
        let entries = sync.compute(&[
            installed("alice", "foo", Path::new("/r/alice/foo")),
            installed("bob", "bar", Path::new("/r/bob/bar")),
        ]);

        assert_eq!(
            entries,
            vec![
                SearchPathEntry {
                    kind: SearchPathKind::Module,
                    dir: PathBuf::from("/r/alice/foo/prolog"),
                },
                SearchPathEntry {
                    kind: SearchPathKind::NativeLibrary,
                    dir: PathBuf::from("/r/bob/bar/lib/x86_64-linux"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_rebuilds_from_disk() {
        let root = tempfile::tempdir().unwrap();
        let foo = root.path().join("alice/foo");
        let bar = root.path().join("bob/bar");
        for dir in [&foo, &bar] {
            std::fs::create_dir_all(dir.join(".git")).unwrap();
            std::fs::create_dir_all(dir.join("prolog")).unwrap();
        }

        let mut git = MockRepoClient::new();
        git.expect_current_tag().returning(|_| Ok("V1.0.0".into()));

        let runtime = RealRuntime;
        let registry = MemoryRegistry::new();
        let store = PackageStore::new(&runtime, &git, root.path().to_path_buf());
        let sync = Synchronizer::new(&runtime, &registry, &linux());

        let entries = sync.sync(&store).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(registry.entries(), entries);

        // Removal is reflected, not just additions
        std::fs::remove_dir_all(&foo).unwrap();
        let entries = sync.sync(&store).await.unwrap();
        assert_eq!(
            registry.entries(),
            vec![SearchPathEntry {
                kind: SearchPathKind::Module,
                dir: bar.join("prolog"),
            }]
        );
        assert_eq!(registry.entries(), entries);

        // Idempotent
        sync.sync(&store).await.unwrap();
        assert_eq!(registry.entries(), entries);
    }

    #[tokio::test]
    async fn test_sync_propagates_publish_failure() {
        let root = tempfile::tempdir().unwrap();
        let git = MockRepoClient::new();
        let runtime = RealRuntime;
        let store = PackageStore::new(&runtime, &git, root.path().to_path_buf());

        let mut registry = MockSearchPathRegistry::new();
        registry
            .expect_publish()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("read-only file system")));

        let sync = Synchronizer::new(&runtime, &registry, &linux());
        assert!(sync.sync(&store).await.is_err());
    }

    #[test]
    fn test_kind_alias() {
        assert_eq!(SearchPathKind::Module.to_string(), "library");
        assert_eq!(SearchPathKind::NativeLibrary.to_string(), "foreign");
    }
}
