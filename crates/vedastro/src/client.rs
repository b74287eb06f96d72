//! Async HTTP client for the VedAstro calculation API.
//!
//! One GET per calculation, no retries. Every response is a
//! `{Status, Payload}` envelope; anything but `Pass` is an error.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::types::{ApiError, ApiResult, Envelope};

/// Public endpoint of the VedAstro API.
pub const DEFAULT_BASE_URL: &str = "https://api.vedastro.org/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the caller's API key downstream.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Client bound to one base URL and, optionally, one API key.
#[derive(Clone)]
pub struct VedAstroClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for VedAstroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VedAstroClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl VedAstroClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: &str, api_key: Option<String>) -> ApiResult<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Same HTTP pool and base URL, different credential.
    pub fn with_api_key(&self, api_key: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key,
        }
    }

    /// URL for `Calculate/{path}`. `path` is appended as-is, slashes included.
    pub fn calculate_url(&self, path: &str) -> ApiResult<Url> {
        Ok(Url::parse(&format!(
            "{}/Calculate/{}",
            self.base_url,
            path.trim_start_matches('/')
        ))?)
    }

    /// Run a calculation and return its payload.
    ///
    /// `label` tags error messages when a tool issues several calls.
    pub async fn calculate(&self, label: Option<&str>, path: &str) -> ApiResult<Value> {
        let url = self.calculate_url(path)?;
        self.fetch(label, url).await
    }

    /// Name-number prediction. The name is percent-encoded as one segment.
    pub async fn name_number_prediction(&self, name: &str) -> ApiResult<Value> {
        let mut url = self.calculate_url("NameNumberPrediction/FullName")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Decode(format!("base URL cannot hold a path: {}", self.base_url)))?
            .push(name);
        self.fetch(None, url).await
    }

    async fn fetch(&self, label: Option<&str>, url: Url) -> ApiResult<Value> {
        tracing::debug!(url = %url, "VedAstro request");

        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "VedAstro returned non-success status");
            return Err(ApiError::Http {
                label: label.map(str::to_string),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.is_pass() {
            return Err(ApiError::Rejected {
                label: label.map(str::to_string),
                payload: envelope.payload_text(),
            });
        }

        Ok(envelope.payload)
    }
}
