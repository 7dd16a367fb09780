use booth_providers::ProviderError;
use thiserror::Error;

/// Single processing-failure condition for the booth flows, always carrying
/// the underlying cause.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("image decode failed: {message}")]
    Decode { message: String },
    #[error("image encode failed: {message}")]
    Encode { message: String },
    #[error("background asset unreadable: {message}")]
    Asset { message: String },
    #[error("background removal failed: {source}")]
    Removal {
        #[source]
        source: ProviderError,
    },
    #[error("image edit failed: {source}")]
    Edit {
        #[source]
        source: ProviderError,
    },
}

impl ComposeError {
    pub(crate) fn decode(context: &str, error: impl std::fmt::Display) -> Self {
        ComposeError::Decode {
            message: format!("{context}: {error}"),
        }
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;
