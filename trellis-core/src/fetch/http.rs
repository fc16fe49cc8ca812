//! HTTP user source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{User, UserSource};
use crate::error::FetchError;

/// Fetches the user record with a single GET request.
#[derive(Debug, Clone)]
pub struct HttpUserSource {
    client: Client,
    endpoint: String,
}

impl HttpUserSource {
    /// Build a source for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Build a source that reuses an existing client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl UserSource for HttpUserSource {
    async fn fetch_user(&self) -> Result<User, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching user");
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
