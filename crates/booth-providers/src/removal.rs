use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::SHORT_CALL_TIMEOUT_MS;

const PROVIDER_NAME: &str = "background-removal";

/// Background-removal seam: PNG in, background-removed RGBA PNG out.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, png: Vec<u8>) -> ProviderResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
/// Configuration for the loopback rembg-shaped service.
pub struct HttpBackgroundRemoverConfig {
    pub api_base: String,
    pub timeout_ms: u64,
}

impl HttpBackgroundRemoverConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            timeout_ms: SHORT_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Removal client: raw PNG bytes in the POST body, PNG bytes back.
pub struct HttpBackgroundRemover {
    client: reqwest::Client,
    config: HttpBackgroundRemoverConfig,
}

impl HttpBackgroundRemover {
    pub fn new(config: HttpBackgroundRemoverConfig) -> ProviderResult<Self> {
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
impl BackgroundRemover for HttpBackgroundRemover {
    async fn remove_background(&self, png: Vec<u8>) -> ProviderResult<Vec<u8>> {
        let url = format!("{}/api/remove", self.config.api_base);
        let response = self
            .client
            .post(url)
            .header("Content-Type", "image/png")
            .timeout(Duration::from_millis(self.config.timeout_ms.max(1)))
            .body(png)
            .send()
            .await
            .map_err(|error| ProviderError::from_request_error(PROVIDER_NAME, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::transport(
                PROVIDER_NAME,
                status.as_u16(),
                &body,
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ProviderError::from_request_error(PROVIDER_NAME, error))?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response(
                PROVIDER_NAME,
                "removal returned an empty image body",
            ));
        }
        Ok(bytes.to_vec())
    }
}
