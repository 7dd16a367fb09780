use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::LONG_CALL_TIMEOUT_MS;

const PROVIDER_NAME: &str = "completion";
const COMPLETION_TEMPERATURE: f64 = 0.6;
const COMPLETION_MAX_TOKENS: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One entry of the assembled message list sent to the completion service.
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            text: text.into(),
        }
    }
}

/// Language-model completion seam.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> ProviderResult<String>;
}

#[derive(Debug, Clone)]
/// Configuration for the foundation-models completion endpoint.
pub struct SpeechKitCompleterConfig {
    pub api_base: String,
    pub api_key: String,
    pub folder_id: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl SpeechKitCompleterConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            model: "yandexgpt-lite".to_string(),
            timeout_ms: LONG_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Completion client; non-streaming, fixed sampling parameters.
pub struct SpeechKitCompleter {
    client: reqwest::Client,
    config: SpeechKitCompleterConfig,
}

impl SpeechKitCompleter {
    pub fn new(config: SpeechKitCompleterConfig) -> ProviderResult<Self> {
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

    fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.config.folder_id, self.config.model)
    }
}

#[async_trait]
impl CompletionProvider for SpeechKitCompleter {
    async fn complete(&self, messages: Vec<ChatMessage>) -> ProviderResult<String> {
        let url = format!("{}/foundationModels/v1/completion", self.config.api_base);
        let payload = json!({
            "modelUri": self.model_uri(),
            "completionOptions": {
                "stream": false,
                "temperature": COMPLETION_TEMPERATURE,
                "maxTokens": COMPLETION_MAX_TOKENS.to_string(),
            },
            "messages": messages,
        });

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
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
        let reply = parsed
            .pointer("/result/alternatives/0/message/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if reply.is_empty() {
            return Err(ProviderError::invalid_response(
                PROVIDER_NAME,
                "missing result.alternatives[0].message.text",
            ));
        }
        Ok(reply)
    }
}
