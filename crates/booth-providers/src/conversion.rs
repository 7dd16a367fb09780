use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use booth_characters::ConversionModel;
use serde_json::{json, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::{LONG_CALL_TIMEOUT_MS, SHORT_CALL_TIMEOUT_MS};

const PROVIDER_NAME: &str = "voice-conversion";

// Fixed acoustic parameters for the convert call, positional:
// pitch shift, input path, _, _, f0 algorithm, _, index path, index blend
// ratio, filter radius, resample rate, rms mix rate, protection ratio.
const CONVERT_PITCH: i64 = 0;
const CONVERT_F0_METHOD: &str = "pm";
const CONVERT_INDEX_RATE: f64 = 0.85;
const CONVERT_FILTER_RADIUS: i64 = 3;
const CONVERT_RESAMPLE_SR: i64 = 0;
const CONVERT_RMS_MIX_RATE: f64 = 0.25;
const CONVERT_PROTECT: f64 = 0.33;

/// Voice-conversion seam: re-renders synthesized speech in a character's
/// cloned timbre. Select-model then convert, both against a loopback service.
#[async_trait]
pub trait VoiceConverter: Send + Sync {
    async fn convert(
        &self,
        model: &ConversionModel,
        input: &Path,
        output: &Path,
    ) -> ProviderResult<()>;
}

#[derive(Debug, Clone)]
/// Configuration for the RVC WebUI loopback endpoint.
pub struct RvcConverterConfig {
    pub api_base: String,
    pub select_timeout_ms: u64,
    pub convert_timeout_ms: u64,
}

impl RvcConverterConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            select_timeout_ms: SHORT_CALL_TIMEOUT_MS,
            convert_timeout_ms: LONG_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// RVC WebUI client. The service answers both calls with a JSON envelope
/// whose `data` field is a positional result list; a null `data` means the
/// operation failed even when the status is 200.
pub struct RvcConverter {
    client: reqwest::Client,
    config: RvcConverterConfig,
}

impl RvcConverter {
    pub fn new(config: RvcConverterConfig) -> ProviderResult<Self> {
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

    async fn post_envelope(
        &self,
        path: &str,
        data: Value,
        timeout_ms: u64,
    ) -> ProviderResult<Value> {
        let url = format!("{}/{}", self.config.api_base, path);
        let response = self
            .client
            .post(url)
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .json(&json!({ "data": data }))
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
        match parsed.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(ProviderError::invalid_response(
                PROVIDER_NAME,
                format!("operation={path} returned null data"),
            )),
        }
    }
}

#[async_trait]
impl VoiceConverter for RvcConverter {
    async fn convert(
        &self,
        model: &ConversionModel,
        input: &Path,
        output: &Path,
    ) -> ProviderResult<()> {
        // Model selection is fatal to the stage; the caller's fallback policy
        // decides what to do with the failure.
        self.post_envelope(
            "run/infer_set",
            json!([format!("{}.pth", model.model), 0.33, 0.33]),
            self.config.select_timeout_ms,
        )
        .await?;

        let index_path = if model.has_index {
            format!("logs/{}.index", model.model)
        } else {
            String::new()
        };
        let data = self
            .post_envelope(
                "run/infer_convert",
                json!([
                    CONVERT_PITCH,
                    input.to_string_lossy(),
                    0,
                    Value::Null,
                    CONVERT_F0_METHOD,
                    "",
                    index_path,
                    CONVERT_INDEX_RATE,
                    CONVERT_FILTER_RADIUS,
                    CONVERT_RESAMPLE_SR,
                    CONVERT_RMS_MIX_RATE,
                    CONVERT_PROTECT,
                ]),
                self.config.convert_timeout_ms,
            )
            .await?;

        let converted_path = data
            .pointer("/1/name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::invalid_response(PROVIDER_NAME, "missing data[1].name in convert response")
            })?;
        tokio::fs::copy(converted_path, output)
            .await
            .map_err(|error| ProviderError::Request {
                provider: PROVIDER_NAME,
                message: format!("failed to copy converted audio from {converted_path}: {error}"),
            })?;
        Ok(())
    }
}
