//! Transcoder doubles for exercising the pipeline without ffmpeg.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{OutputSpec, TranscodeError, Transcoder};

/// Copies the input bytes under the spec's output name, so "transcoded"
/// artifacts stay byte-identical to their sources.
#[derive(Debug, Default)]
pub struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, input: &Path, spec: OutputSpec) -> Result<PathBuf, TranscodeError> {
        let output = input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(spec.output_name());
        tokio::fs::copy(input, &output)
            .await
            .map_err(|error| TranscodeError::Spawn {
                tool: "copy".to_string(),
                message: error.to_string(),
            })?;
        Ok(output)
    }
}

/// Always fails, for fatal-transcode coverage.
#[derive(Debug, Default)]
pub struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, _input: &Path, _spec: OutputSpec) -> Result<PathBuf, TranscodeError> {
        Err(TranscodeError::NonZeroExit {
            tool: "ffmpeg".to_string(),
            status: 1,
            stderr: "invalid data found when processing input".to_string(),
        })
    }
}
