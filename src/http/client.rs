//! HTTP client for forge API requests.

use anyhow::Result;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::PackError;

use super::status::{classify_error, describe_status};

/// Thin wrapper over reqwest that reports every failure as a forge failure.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PackError::ForgeUnavailable(describe_status(status, &body)).into());
        }

        response.json::<T>().await.map_err(classify_error)
    }
}
