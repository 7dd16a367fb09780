use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, ProviderResult};
use crate::SHORT_CALL_TIMEOUT_MS;

const PROVIDER_NAME: &str = "recognition";

/// Speech-to-text seam; the pipeline only sees recognized text.
#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    async fn recognize(&self, audio: Vec<u8>) -> ProviderResult<String>;
}

#[derive(Debug, Clone)]
/// Configuration for the SpeechKit-shaped recognition endpoint.
pub struct SpeechKitRecognizerConfig {
    pub api_base: String,
    pub api_key: String,
    pub folder_id: String,
    pub lang: String,
    pub timeout_ms: u64,
}

impl SpeechKitRecognizerConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            lang: "ru-RU".to_string(),
            timeout_ms: SHORT_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Recognition client: audio bytes in the POST body, language and folder
/// context as query parameters, `Api-Key` auth header.
pub struct SpeechKitRecognizer {
    client: reqwest::Client,
    config: SpeechKitRecognizerConfig,
}

impl SpeechKitRecognizer {
    pub fn new(config: SpeechKitRecognizerConfig) -> ProviderResult<Self> {
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
impl RecognitionProvider for SpeechKitRecognizer {
    async fn recognize(&self, audio: Vec<u8>) -> ProviderResult<String> {
        let url = format!("{}/speech/v1/stt:recognize", self.config.api_base);
        let response = self
            .client
            .post(url)
            .query(&[
                ("lang", self.config.lang.as_str()),
                ("folderId", self.config.folder_id.as_str()),
            ])
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .timeout(Duration::from_millis(self.config.timeout_ms.max(1)))
            .body(audio)
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
        let text = parsed
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyRecognition);
        }
        Ok(text)
    }
}
