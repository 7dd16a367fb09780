use thiserror::Error;

/// Failures surfaced by external-service adapters.
///
/// `Transport` carries the upstream status and body unmodified so the
/// pipeline can propagate them verbatim; `EmptyRecognition` is deliberately
/// distinct from a transport failure so an unrecognized clip is never
/// reported as a generic upstream error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned status={status}: {body}")]
    Transport {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("could not recognize speech")]
    EmptyRecognition,
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub(crate) fn from_request_error(provider: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return ProviderError::Timeout { provider };
        }
        ProviderError::Request {
            provider,
            message: error.to_string(),
        }
    }

    pub(crate) fn transport(provider: &'static str, status: u16, body: &str) -> Self {
        ProviderError::Transport {
            provider,
            status,
            body: booth_core::truncate_error_body(body),
        }
    }

    pub(crate) fn invalid_response(provider: &'static str, message: impl Into<String>) -> Self {
        ProviderError::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
