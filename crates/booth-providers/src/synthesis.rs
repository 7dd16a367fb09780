use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::SHORT_CALL_TIMEOUT_MS;

const PROVIDER_NAME: &str = "synthesis";
const SYNTHESIS_FORMAT: &str = "oggopus";
const SYNTHESIS_SAMPLE_RATE_HZ: &str = "48000";

/// Text-to-speech seam; returns raw encoded audio bytes.
#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
/// Configuration for the SpeechKit-shaped synthesis endpoint.
pub struct SpeechKitSynthesizerConfig {
    pub api_base: String,
    pub api_key: String,
    pub folder_id: String,
    pub lang: String,
    pub timeout_ms: u64,
}

impl SpeechKitSynthesizerConfig {
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
/// Synthesis client: form-encoded text/voice/format parameters, raw audio
/// bytes back on success.
pub struct SpeechKitSynthesizer {
    client: reqwest::Client,
    config: SpeechKitSynthesizerConfig,
}

impl SpeechKitSynthesizer {
    pub fn new(config: SpeechKitSynthesizerConfig) -> ProviderResult<Self> {
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
impl SynthesisProvider for SpeechKitSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<Vec<u8>> {
        let url = format!("{}/speech/v1/tts:synthesize", self.config.api_base);
        let form = [
            ("text", text),
            ("lang", self.config.lang.as_str()),
            ("voice", voice),
            ("folderId", self.config.folder_id.as_str()),
            ("format", SYNTHESIS_FORMAT),
            ("sampleRateHertz", SYNTHESIS_SAMPLE_RATE_HZ),
        ];

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .timeout(Duration::from_millis(self.config.timeout_ms.max(1)))
            .form(&form)
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

        let audio = response
            .bytes()
            .await
            .map_err(|error| ProviderError::from_request_error(PROVIDER_NAME, error))?;
        if audio.is_empty() {
            return Err(ProviderError::invalid_response(
                PROVIDER_NAME,
                "synthesis returned an empty audio body",
            ));
        }
        Ok(audio.to_vec())
    }
}
