//! Audio transcoding behind a narrow `Transcoder` capability.
//!
//! The pipeline never shells out directly; it asks for
//! `(input path, output spec) -> output path` and this crate keeps process
//! invocation and exit-code inspection internal. A non-zero exit is a fatal
//! failure for the requesting stage.

pub mod testing;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },
    #[error("{tool} exited with status {status}: {stderr}")]
    NonZeroExit {
        tool: String,
        status: i32,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Target formats the pipeline needs, with their fixed channel/rate knobs.
pub enum OutputSpec {
    /// Mono OggOpus at 48 kHz, the recognition service's input format.
    RecognitionOpus,
    /// Mono WAV at 40 kHz, the conversion service's input format.
    ConversionWav,
    /// 128 kbps MP3, the caller-facing delivery format.
    DeliveryMp3,
}

impl OutputSpec {
    /// File name the transcode writes inside the run's scratch directory.
    pub fn output_name(self) -> &'static str {
        match self {
            OutputSpec::RecognitionOpus => "stt-input.ogg",
            OutputSpec::ConversionWav => "tts.wav",
            OutputSpec::DeliveryMp3 => "final.mp3",
        }
    }

    fn ffmpeg_args(self) -> Vec<&'static str> {
        match self {
            OutputSpec::RecognitionOpus => vec!["-ac", "1", "-ar", "48000", "-c:a", "libopus"],
            OutputSpec::ConversionWav => vec!["-ar", "40000", "-ac", "1"],
            OutputSpec::DeliveryMp3 => vec!["-acodec", "libmp3lame", "-b:a", "128k"],
        }
    }
}

/// Transcoding capability; one operation, failures typed.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, spec: OutputSpec) -> Result<PathBuf, TranscodeError>;
}

#[derive(Debug, Clone)]
/// ffmpeg-backed transcoder. Output lands next to the input file under the
/// spec's fixed name; `-y` overwrites any stale artifact from the same run.
pub struct FfmpegTranscoder {
    binary: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, spec: OutputSpec) -> Result<PathBuf, TranscodeError> {
        let output = input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(spec.output_name());

        let mut command = Command::new(&self.binary);
        command.arg("-y").arg("-i").arg(input);
        command.args(spec.ffmpeg_args());
        command.arg(&output);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let result = command.output().await.map_err(|error| TranscodeError::Spawn {
            tool: self.binary.clone(),
            message: error.to_string(),
        })?;

        if !result.status.success() {
            return Err(TranscodeError::NonZeroExit {
                tool: self.binary.clone(),
                status: result.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}
