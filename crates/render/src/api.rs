//! REST client for the text-to-image endpoint.
//!
//! Sends one JSON request per diagram and extracts the image URL from the
//! response. Hosted providers disagree on where the URL lives, so
//! [`extract_image_url`] accepts the common shapes.

use serde::Serialize;
use serde_json::Value;

use crate::config::RenderConfig;

/// HTTP client for the image generation endpoint.
#[derive(Debug)]
pub struct DiagramApi {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

/// Body of a generation request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub width: u32,
    pub height: u32,
}

/// Errors from the rendering layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("Image API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response that did not contain an image URL.
    #[error("Image API response did not contain an image URL")]
    MissingUrl,

    /// `DIAGRAM_API_URL` is not set.
    #[error("Diagram generation is not configured (DIAGRAM_API_URL unset)")]
    NotConfigured,
}

impl DiagramApi {
    /// Build a client from configuration.
    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        let api_url = config.api_url.clone().ok_or(RenderError::NotConfigured)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Request one image and return its URL.
    pub async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, RenderError> {
        let mut builder = self.client.post(&self.api_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = Self::ensure_success(builder.send().await?).await?;
        let body: Value = response.json().await?;
        extract_image_url(&body).ok_or(RenderError::MissingUrl)
    }

    /// Ensure the response has a success status code, otherwise capture the
    /// status and body text as [`RenderError::ApiError`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Find the image URL in a provider response.
///
/// Recognised shapes, in order: `{"url"}`, `{"image_url"}`,
/// `{"data": [{"url"}]}`, `{"images": [{"url"}]}`, `{"output": ["..."]}`.
pub fn extract_image_url(body: &Value) -> Option<String> {
    let candidates = [
        body.get("url"),
        body.get("image_url"),
        body.pointer("/data/0/url"),
        body.pointer("/images/0/url"),
        body.pointer("/output/0"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
