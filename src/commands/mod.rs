use std::path::Path;

use crate::application::Report;

pub mod config;
mod install;
mod list;
mod paths;
mod remove;
mod sync;
mod update;
mod updates;

pub use install::install;
pub use list::list;
pub use paths::default_install_root;
pub use remove::remove;
pub use sync::sync;
pub use update::update;
pub use updates::updates;

pub(crate) fn print_report(report: &Report, search_paths_file: &Path) {
    for change in &report.changes {
        println!("{}", change);
    }
    println!(
        "{} search path(s) published to {}",
        report.search_paths.len(),
        search_paths_file.display()
    );
}

#[cfg(test)]
mod tests {
    use super::config::{Config, Options};
    use super::*;
    use crate::error::PackError;
    use crate::forge::{InvalidPackageRef, PackageRef};
    use crate::runtime::RealRuntime;
    use tempfile::TempDir;

    fn config_in(root: &TempDir) -> Config<RealRuntime> {
        Config::new(
            RealRuntime,
            Options {
                install_root: Some(root.path().to_path_buf()),
                // Nothing listens here; commands below must not reach the forge
                api_url: Some("http://127.0.0.1:9".into()),
                git_url: None,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_empty_root() {
        let root = tempfile::tempdir().unwrap();
        list(&config_in(&root)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let config = Config::new(
            RealRuntime,
            Options {
                install_root: Some(root.path().join("does-not-exist")),
                ..Options::default()
            },
        )
        .unwrap();
        list(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_updates_empty_root() {
        let root = tempfile::tempdir().unwrap();
        updates(&config_in(&root)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_all_empty_root_writes_search_paths() {
        let root = tempfile::tempdir().unwrap();
        update(&config_in(&root), None).await.unwrap();
        assert!(root.path().join("search_paths.pl").exists());
    }

    #[tokio::test]
    async fn test_remove_not_installed() {
        let root = tempfile::tempdir().unwrap();
        let err = remove(&config_in(&root), &PackageRef::new("alice", "foo"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::NotInstalled(_))
        ));
    }

    #[tokio::test]
    async fn test_update_not_installed() {
        let root = tempfile::tempdir().unwrap();
        let err = update(&config_in(&root), Some(PackageRef::new("alice", "foo")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::NotInstalled(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_publishes_existing_directories() {
        let root = tempfile::tempdir().unwrap();
        sync(&config_in(&root)).await.unwrap();

        let written = std::fs::read_to_string(root.path().join("search_paths.pl")).unwrap();
        assert!(written.contains("file_search_path/2"));
        assert!(!written.contains("user:file_search_path(library"));
    }

    #[tokio::test]
    async fn test_install_rejects_bad_version_before_network() {
        let root = tempfile::tempdir().unwrap();
        let err = install(&config_in(&root), "alice", "foo", Some("one.two"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid version"));
        assert!(!root.path().join("alice").exists());
    }

    #[tokio::test]
    async fn test_install_rejects_coordinates_outside_root() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(&root);
        for (owner, name) in [("..", "foo"), ("alice", "../../foo"), ("alice", "")] {
            let err = install(&config, owner, name, None).await.unwrap_err();
            assert!(err.downcast_ref::<InvalidPackageRef>().is_some());
        }
        assert!(std::fs::read_dir(root.path()).unwrap().next().is_none());
    }
}
