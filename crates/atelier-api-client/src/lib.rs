//! HTTP client for the upstream image API.
//!
//! Provides a minimal client with bearer auth and JSON/multipart POST helpers,
//! plus the [`ImageApi`] trait the MCP server programs against. Errors are
//! mapped into [`ImageToolError`]: transport failures become `Network`,
//! non-2xx responses become `UpstreamApi` with the status and response body.

pub mod api;

use atelier_core::{Config, ImageToolError, ToolResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use api::{EditRequest, GenerationRequest, ImageApi, UpstreamImage};

/// HTTP client for an OpenAI-compatible images API.
#[derive(Clone, Debug)]
pub struct ImageApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ImageApiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> ToolResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageToolError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn from_config(config: &Config) -> ToolResult<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.image_model.clone(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.api_key)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ToolResult<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));
        let response = request.send().await.map_err(|e| transport_error(&url, e))?;
        read_json(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ToolResult<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));
        let response = request.send().await.map_err(|e| transport_error(&url, e))?;
        read_json(response).await
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> ImageToolError {
    if err.is_timeout() {
        ImageToolError::Network(format!("Request to {} timed out", url))
    } else {
        ImageToolError::Network(format!("Failed to send request to {}: {}", url, err))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ToolResult<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), "Upstream API request failed");
        return Err(ImageToolError::UpstreamApi {
            status: Some(status.as_u16()),
            message: error_text,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ImageToolError::UpstreamApi {
            status: Some(status.as_u16()),
            message: format!("Failed to parse response as JSON: {}", e),
        })
}
