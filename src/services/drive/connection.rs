use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{DriveError, Result};
use super::config::DriveConfig;

/// Error body the Drive API returns on non-2xx responses
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
}

/// Authenticated HTTP plumbing for the Drive REST API.
///
/// Requests are sent once; failures are returned to the caller as they are.
#[derive(Debug, Clone)]
pub struct DriveConnection {
    client: Client,
    config: DriveConfig,
}

impl DriveConnection {
    pub fn new(config: DriveConfig) -> Result<Self> {
        // Validate configuration first
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.client.get(url).query(query);
        self.send(request, url).await
    }

    /// POST a JSON body and decode the JSON answer
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Result<T> {
        let request = self.client.post(url).query(query).json(body);
        self.send(request, url).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Drive request to {} failed with status {}", url, status);
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Builds a `RemoteApi` error, preferring the message from Google's error envelope
    async fn error_from_response(response: Response) -> DriveError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body
                }
            });

        DriveError::remote_api(status.as_u16(), message)
    }
}
