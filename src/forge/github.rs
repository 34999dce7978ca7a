//! GitHub forge implementation.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
#[cfg(test)]
use reqwest::Client;

use crate::http::HttpClient;

use super::{Forge, PackageRef};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Tags fetched per page, and the page cap.
const PER_PAGE: &str = "100";
const MAX_PAGES: u32 = 10;

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Tag {
        pub name: String,
    }
}

/// GitHub forge implementation.
pub struct GitHubForge {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubForge {
    /// Create a GitHub forge against the public API.
    #[cfg(test)]
    pub fn new(client: Client) -> Self {
        Self::from_http_client(HttpClient::new(client), DEFAULT_API_URL)
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_tags(&self, package: &PackageRef) -> Result<Vec<api::Tag>> {
        let mut tags = Vec::new();
        let url = format!(
            "{}/repos/{}/{}/tags",
            self.api_url, package.owner, package.name
        );

        // Bounded so a misbehaving server cannot page forever
        for page in 1..=MAX_PAGES {
            debug!("Fetching tags page {} from {}...", page, url);

            let parsed: Vec<api::Tag> = self
                .http_client
                .get_json_with_query(&url, &[("per_page", PER_PAGE), ("page", &page.to_string())])
                .await?;

            if parsed.is_empty() {
                break;
            }

            tags.extend(parsed);
        }

        Ok(tags)
    }
}

#[async_trait]
impl Forge for GitHubForge {
    #[tracing::instrument(skip(self))]
    async fn list_tags(&self, package: &PackageRef) -> Result<Vec<String>> {
        let tags = self.fetch_tags(package).await?;
        debug!("{} has {} tag(s)", package, tags.len());
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}
