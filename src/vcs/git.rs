//! `git` subprocess implementation of [`RepoClient`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use tokio::process::Command;

use crate::error::PackError;
use crate::package::Version;

use super::RepoClient;

/// Runs the `git` executable found on `PATH`.
#[derive(Debug, Clone)]
pub struct GitClient {
    program: String,
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git and return its trimmed stdout.
    ///
    /// `output()` drains stdout and stderr concurrently before waiting on the child.
    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(std::process::Stdio::null());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!("Running {} {:?} in {:?}", self.program, args, cwd);
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            return Err(PackError::RepoOperation {
                operation: format!("{} {}", self.program, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl RepoClient for GitClient {
    #[tracing::instrument(skip(self))]
    async fn clone_repo(&self, dest: &Path, remote_uri: &str) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run(None, &["clone", "--quiet", remote_uri, dest.as_ref()])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["fetch", "--quiet", "--tags", "--force"])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn checkout(&self, dir: &Path, tag: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}", tag);
        self.run(
            Some(dir),
            &[
                "-c",
                "advice.detachedHead=false",
                "checkout",
                "--quiet",
                &refspec,
            ],
        )
        .await?;
        Ok(())
    }

    /// The highest version tag pointing exactly at HEAD.
    #[tracing::instrument(skip(self))]
    async fn current_tag(&self, dir: &Path) -> Result<String> {
        let args = ["tag", "--points-at", "HEAD"];
        let listed = self.run(Some(dir), &args).await?;

        listed
            .lines()
            .filter_map(|tag| tag.trim().parse::<Version>().ok().map(|v| (v, tag.trim())))
            .max_by_key(|(version, _)| *version)
            .map(|(_, tag)| tag.to_string())
            .ok_or_else(|| {
                PackError::RepoOperation {
                    operation: format!("{} {}", self.program, args.join(" ")),
                    stderr: "no version tag points at HEAD".to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let client = GitClient::new("plpm-no-such-git-binary");
        let dir = tempdir().unwrap();
        assert!(client.fetch(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_command_carries_stderr() {
        let client = GitClient::default();
        if client.run(None, &["--version"]).await.is_err() {
            return; // git not installed
        }

        let dir = tempdir().unwrap();
        let err = client.current_tag(dir.path()).await.unwrap_err();
        match err.downcast_ref::<PackError>() {
            Some(PackError::RepoOperation { operation, stderr }) => {
                assert!(operation.contains("--points-at"));
                assert!(!stderr.trim().is_empty());
            }
            other => panic!("Expected RepoOperation, got {:?}", other),
        }
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn commit(dir: &Path, message: &str) {
        std::fs::write(dir.join("README"), message).unwrap();
        git(dir, &["add", "README"]);
        git(dir, &["commit", "--quiet", "-m", message]);
    }

    #[tokio::test]
    async fn test_current_tag_is_the_checked_out_tag() {
        let client = GitClient::default();
        if client.run(None, &["--version"]).await.is_err() {
            return; // git not installed
        }

        let dir = tempdir().unwrap();
        let repo = dir.path();
        git(repo, &["init", "--quiet"]);
        commit(repo, "first");
        git(repo, &["tag", "V1.0.0"]);
        commit(repo, "second");
        for tag in ["V1.2.0", "V1.2.1", "latest"] {
            git(repo, &["tag", tag]);
        }

        // Several tags on one commit: the highest version wins, others are ignored
        client.checkout(repo, "V1.2.0").await.unwrap();
        assert_eq!(client.current_tag(repo).await.unwrap(), "V1.2.1");

        client.checkout(repo, "V1.0.0").await.unwrap();
        assert_eq!(client.current_tag(repo).await.unwrap(), "V1.0.0");

        // An untagged HEAD does not borrow an ancestor's tag
        client.checkout(repo, "V1.2.1").await.unwrap();
        commit(repo, "third");
        let err = client.current_tag(repo).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::RepoOperation { .. })
        ));
    }
}
