use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use std::path::PathBuf;

use crate::{
    application::Resolver,
    forge::{DEFAULT_API_URL, GitHubForge},
    http::HttpClient,
    package::PackageStore,
    platform::Platform,
    runtime::Runtime,
    search_path::{FileRegistry, SearchPathRegistry, Synchronizer},
    vcs::{DEFAULT_GIT_URL, GitClient},
};

use super::paths::default_install_root;

/// Global command line options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub install_root: Option<PathBuf>,
    pub api_url: Option<String>,
    pub git_url: Option<String>,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub forge: GitHubForge,
    pub git: GitClient,
    pub platform: Platform,
    pub install_root: PathBuf,
    pub git_url: String,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: Options) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication: {}", mask(&token));
        }

        let client = Client::builder()
            .user_agent("plpm-cli")
            .default_headers(headers)
            .build()?;

        let api_url = options.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let forge = GitHubForge::from_http_client(HttpClient::new(client), api_url);

        let install_root = match options.install_root {
            Some(path) => path,
            None => default_install_root(&runtime)?,
        };
        debug!("Using install root: {}", install_root.display());

        Ok(Self {
            runtime,
            forge,
            git: GitClient::default(),
            platform: Platform::detect(),
            install_root,
            git_url: options.git_url.unwrap_or_else(|| DEFAULT_GIT_URL.to_string()),
        })
    }

    pub fn store(&self) -> PackageStore<'_, R> {
        PackageStore::new(&self.runtime, &self.git, self.install_root.clone())
    }

    /// The search path file of this install root.
    pub fn registry(&self) -> FileRegistry<'_, R> {
        FileRegistry::in_root(&self.runtime, &self.install_root)
    }

    pub fn resolver<'a>(&'a self, registry: &'a dyn SearchPathRegistry) -> Resolver<'a, R> {
        let synchronizer = Synchronizer::new(&self.runtime, registry, &self.platform);
        Resolver::new(self.store(), &self.forge, synchronizer).with_git_url(&self.git_url)
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::{Forge, PackageRef};
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};

    fn runtime_with_token(token: Option<&str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let token = token.map(|t| t.to_string());
        runtime
            .expect_env_var()
            .with(mockall::predicate::eq("GITHUB_TOKEN"))
            .returning(move |_| token.clone().ok_or(std::env::VarError::NotPresent));
        runtime
    }

    /// Helper function to verify Authorization header behavior
    async fn verify_authorization_header(token: Option<&str>) {
        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/repos/alice/foo/tags")
            .match_query(Matcher::Any)
            .match_header("Authorization", expected_header)
            .match_header("User-Agent", "plpm-cli")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let config = Config::new(
            runtime_with_token(token),
            Options {
                install_root: Some(PathBuf::from("/tmp/plpm")),
                api_url: Some(server.url()),
                git_url: None,
            },
        )
        .unwrap();
        let tags = config
            .forge
            .list_tags(&PackageRef::new("alice", "foo"))
            .await
            .unwrap();

        assert!(tags.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_config_new_with_github_token() {
        verify_authorization_header(Some("ghp_1234567890abcdef")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_github_token() {
        verify_authorization_header(None).await;
    }

    #[test]
    fn test_config_defaults() {
        let mut runtime = runtime_with_token(None);
        runtime.expect_is_privileged().returning(|| false);
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));

        let config = Config::new(runtime, Options::default()).unwrap();
        assert_eq!(config.install_root, PathBuf::from("/home/user/.plpm"));
        assert_eq!(config.git_url, DEFAULT_GIT_URL);
    }

    #[test]
    fn test_resolver_uses_git_url() {
        let config = Config::new(
            runtime_with_token(None),
            Options {
                install_root: Some(PathBuf::from("/srv/plpm")),
                api_url: None,
                git_url: Some("file:///srv/remotes/".into()),
            },
        )
        .unwrap();
        let registry = config.registry();
        let resolver = config.resolver(&registry);

        assert_eq!(
            resolver.remote_uri(&PackageRef::new("alice", "foo")),
            "file:///srv/remotes/alice/foo.git"
        );
        assert_eq!(registry.path(), PathBuf::from("/srv/plpm/search_paths.pl"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*********");
        assert_eq!(mask("ghp_1234567890abcdef"), "ghp_1234*********cdef");
    }
}
