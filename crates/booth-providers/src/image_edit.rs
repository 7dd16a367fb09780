use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::error::{ProviderError, ProviderResult};

const PROVIDER_NAME: &str = "image-edit";
const DEFAULT_EDIT_MODEL: &str = "google/gemini-2.5-flash-image";
const EDIT_CALL_TIMEOUT_MS: u64 = 60_000;

/// Hosted generative image-edit seam: composite PNG plus an instruction in,
/// edited image bytes out.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, png: Vec<u8>, instruction: &str) -> ProviderResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
/// Configuration for the OpenRouter-shaped chat-completions edit endpoint.
pub struct OpenRouterImageEditorConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl OpenRouterImageEditorConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: DEFAULT_EDIT_MODEL.to_string(),
            timeout_ms: EDIT_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Image-edit client. The image travels as a `data:image/png;base64,` URL in
/// the message content; the edited image comes back the same way at
/// `choices[0].message.images[0].image_url.url`.
pub struct OpenRouterImageEditor {
    client: reqwest::Client,
    config: OpenRouterImageEditorConfig,
}

impl OpenRouterImageEditor {
    pub fn new(config: OpenRouterImageEditorConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|error| {
            ProviderError::Request {
                provider: PROVIDER_NAME,
                message: format!("failed to initialize http client: {error}"),
            }
        })?;
        let mut normalized = config;
        normalized.api_base = normalized.api_base.trim().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            config: normalized,
        })
    }
}

#[async_trait]
impl ImageEditor for OpenRouterImageEditor {
    async fn edit(&self, png: Vec<u8>, instruction: &str) -> ProviderResult<Vec<u8>> {
        let url = format!("{}/api/v1/chat/completions", self.config.api_base);
        let image_base64 = BASE64_STANDARD.encode(png);
        let payload = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{image_base64}") }
                    },
                    { "type": "text", "text": instruction }
                ]
            }]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.api_key.trim())
            .timeout(Duration::from_millis(self.config.timeout_ms.max(1)))
            .json(&payload)
            .send()
            .await
            .map_err(|error| ProviderError::from_request_error(PROVIDER_NAME, error))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProviderError::transport(
                PROVIDER_NAME,
                status.as_u16(),
                &body,
            ));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|error| {
            ProviderError::invalid_response(PROVIDER_NAME, format!("invalid json: {error}"))
        })?;
        let image_url = parsed
            .pointer("/choices/0/message/images/0/image_url/url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::invalid_response(
                    PROVIDER_NAME,
                    "missing choices[0].message.images[0].image_url.url",
                )
            })?;
        let encoded = image_url.split_once("base64,").map(|(_, rest)| rest).ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "image_url is not a base64 data url")
        })?;
        BASE64_STANDARD.decode(encoded).map_err(|error| {
            ProviderError::invalid_response(
                PROVIDER_NAME,
                format!("edited image base64 decode failed: {error}"),
            )
        })
    }
}
