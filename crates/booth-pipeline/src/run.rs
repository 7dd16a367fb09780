use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use booth_characters::profile_for;
use booth_core::ScratchDir;
use booth_history::{HistoryStore, TurnRole};
use booth_providers::{
    ChatMessage, CompletionProvider, ProviderError, RecognitionProvider, SynthesisProvider,
    VoiceConverter,
};
use booth_transcode::{OutputSpec, Transcoder};

use crate::record::ReplyRecord;

const INPUT_FILE_NAME: &str = "input.ogg";
const SYNTHESIS_FILE_NAME: &str = "synth.ogg";
const CONVERTED_FILE_NAME: &str = "converted.wav";

fn advance(stage: &mut ReplyStage, next: ReplyStage) {
    *stage = next;
    tracing::trace!(stage = next.as_str(), "stage complete");
}

#[derive(Debug, Clone)]
/// One inbound voice turn.
pub struct ReplyRequest {
    pub caller: String,
    pub character: String,
    pub audio: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-request progression. `Failed` is absorbing and reachable only from
/// the fatal stages; the conversion stage degrades to
/// `FallbackSynthesized` instead.
pub enum ReplyStage {
    Init,
    Transcoded,
    Recognized,
    Completed,
    Synthesized,
    Converted,
    FallbackSynthesized,
    Finalized,
    Failed,
}

impl ReplyStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyStage::Init => "init",
            ReplyStage::Transcoded => "transcoded",
            ReplyStage::Recognized => "recognized",
            ReplyStage::Completed => "completed",
            ReplyStage::Synthesized => "synthesized",
            ReplyStage::Converted => "converted",
            ReplyStage::FallbackSynthesized => "fallback_synthesized",
            ReplyStage::Finalized => "finalized",
            ReplyStage::Failed => "failed",
        }
    }
}

#[derive(Debug)]
/// Outcome of the best-effort voice-conversion stage. Callers branch on the
/// tag; the fallback reason never reaches the caller-facing record stream.
pub enum ConversionOutcome {
    Converted(PathBuf),
    Fallback { audio: PathBuf, reason: String },
}

impl ConversionOutcome {
    fn audio_path(&self) -> &Path {
        match self {
            ConversionOutcome::Converted(path) => path,
            ConversionOutcome::Fallback { audio, .. } => audio,
        }
    }

    fn stage(&self) -> ReplyStage {
        match self {
            ConversionOutcome::Converted(_) => ReplyStage::Converted,
            ConversionOutcome::Fallback { .. } => ReplyStage::FallbackSynthesized,
        }
    }
}

/// The fixed ten-stage orchestration. All collaborators are injected; the
/// pipeline itself only moves bytes between them and applies the fallback
/// policy. No stage is ever retried.
pub struct ReplyPipeline {
    recognizer: Arc<dyn RecognitionProvider>,
    completer: Arc<dyn CompletionProvider>,
    synthesizer: Arc<dyn SynthesisProvider>,
    converter: Arc<dyn VoiceConverter>,
    transcoder: Arc<dyn Transcoder>,
    history: Arc<HistoryStore>,
    scratch_root: PathBuf,
}

impl ReplyPipeline {
    pub fn new(
        recognizer: Arc<dyn RecognitionProvider>,
        completer: Arc<dyn CompletionProvider>,
        synthesizer: Arc<dyn SynthesisProvider>,
        converter: Arc<dyn VoiceConverter>,
        transcoder: Arc<dyn Transcoder>,
        history: Arc<HistoryStore>,
        scratch_root: PathBuf,
    ) -> Self {
        Self {
            recognizer,
            completer,
            synthesizer,
            converter,
            transcoder,
            history,
            scratch_root,
        }
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Runs one request on a spawned task, streaming records as stages
    /// complete. The stream ends after the terminal record.
    pub fn stream_reply(self: &Arc<Self>, request: ReplyRequest) -> UnboundedReceiverStream<ReplyRecord> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run_with_sink(request, sender).await;
        });
        UnboundedReceiverStream::new(receiver)
    }

    /// Runs one request and delivers records through `sender`. Exactly one
    /// terminal record is always sent; the scratch directory is removed on
    /// every exit path.
    pub async fn run_with_sink(
        &self,
        request: ReplyRequest,
        sender: mpsc::UnboundedSender<ReplyRecord>,
    ) {
        match self.execute(&request, &sender).await {
            Ok(()) => {}
            Err(error) => {
                tracing::debug!(
                    caller = %request.caller,
                    character = %request.character,
                    error = %error,
                    "voice reply run failed"
                );
                let _ = sender.send(ReplyRecord::Error {
                    message: error.to_string(),
                });
            }
        }
    }

    /// Convenience used by tests: runs one request and collects the full
    /// record sequence.
    pub async fn run_collect(&self, request: ReplyRequest) -> Vec<ReplyRecord> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        self.run_with_sink(request, sender).await;
        let mut records = Vec::new();
        while let Ok(record) = receiver.try_recv() {
            records.push(record);
        }
        records
    }

    async fn execute(
        &self,
        request: &ReplyRequest,
        sender: &mpsc::UnboundedSender<ReplyRecord>,
    ) -> Result<(), ProviderError> {
        let mut stage = ReplyStage::Init;
        tracing::trace!(stage = stage.as_str(), "voice reply run started");
        let profile = profile_for(&request.character);
        let scratch =
            ScratchDir::create(&self.scratch_root, "reply").map_err(|error| ProviderError::Request {
                provider: "pipeline",
                message: format!("failed to create working directory: {error}"),
            })?;

        // 1. Persist the upload so the transcoder has a file to read.
        let input_path = scratch.file(INPUT_FILE_NAME);
        tokio::fs::write(&input_path, &request.audio)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "pipeline",
                message: format!("failed to persist upload: {error}"),
            })?;

        // 2. Transcode to the recognition input format. Fatal on failure.
        let stt_input = self
            .transcoder
            .transcode(&input_path, OutputSpec::RecognitionOpus)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "transcode",
                message: error.to_string(),
            })?;
        advance(&mut stage, ReplyStage::Transcoded);

        // 3. Recognize and disclose the transcript before generating a reply.
        let stt_bytes = tokio::fs::read(&stt_input)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "pipeline",
                message: format!("failed to read transcoded audio: {error}"),
            })?;
        let recognized = self.recognizer.recognize(stt_bytes).await?;
        advance(&mut stage, ReplyStage::Recognized);
        let _ = sender.send(ReplyRecord::Stt {
            text: recognized.clone(),
        });

        // 4-5. Assemble the prompt and complete. History is only touched
        // after a successful completion so a failure never pollutes it.
        let messages = self.assemble_messages(request, &profile.persona_prompt, &recognized);
        let reply_text = self.completer.complete(messages).await?;
        self.history
            .record_turn(&request.caller, &request.character, TurnRole::User, &recognized);
        self.history.record_turn(
            &request.caller,
            &request.character,
            TurnRole::Assistant,
            &reply_text,
        );
        advance(&mut stage, ReplyStage::Completed);

        // 6. Synthesize the reply in the character's configured voice.
        let synthesized = self
            .synthesizer
            .synthesize(&reply_text, &profile.voice)
            .await?;
        let synth_path = scratch.file(SYNTHESIS_FILE_NAME);
        tokio::fs::write(&synth_path, &synthesized)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "pipeline",
                message: format!("failed to persist synthesized audio: {error}"),
            })?;
        advance(&mut stage, ReplyStage::Synthesized);

        // 7. Transcode for the conversion service.
        let conversion_input = self
            .transcoder
            .transcode(&synth_path, OutputSpec::ConversionWav)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "transcode",
                message: error.to_string(),
            })?;

        // 8. Voice conversion, best-effort.
        let outcome = self
            .convert_voice(request, &scratch, &conversion_input)
            .await;
        advance(&mut stage, outcome.stage());

        // 9. Final transcode to the delivery format.
        let final_path = self
            .transcoder
            .transcode(outcome.audio_path(), OutputSpec::DeliveryMp3)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "transcode",
                message: error.to_string(),
            })?;

        // 10. Deliver.
        let final_bytes = tokio::fs::read(&final_path)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "pipeline",
                message: format!("failed to read final audio: {error}"),
            })?;
        let _ = sender.send(ReplyRecord::Final {
            reply_text,
            audio_base64: BASE64_STANDARD.encode(final_bytes),
        });
        advance(&mut stage, ReplyStage::Finalized);
        tracing::debug!(
            caller = %request.caller,
            character = %request.character,
            stage = stage.as_str(),
            "voice reply run finished"
        );
        Ok(())
    }

    fn assemble_messages(
        &self,
        request: &ReplyRequest,
        persona_prompt: &str,
        recognized: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(persona_prompt)];
        for turn in self.history.get_turns(&request.caller, &request.character) {
            messages.push(ChatMessage {
                role: turn.role.as_str().to_string(),
                text: turn.text,
            });
        }
        messages.push(ChatMessage::user(recognized));
        messages
    }

    async fn convert_voice(
        &self,
        request: &ReplyRequest,
        scratch: &ScratchDir,
        synthesized: &Path,
    ) -> ConversionOutcome {
        let Some(model) = profile_for(&request.character).conversion else {
            tracing::debug!(
                character = %request.character,
                "no conversion model configured, keeping synthesized audio"
            );
            return ConversionOutcome::Fallback {
                audio: synthesized.to_path_buf(),
                reason: "no conversion model configured".to_string(),
            };
        };
        let converted = scratch.file(CONVERTED_FILE_NAME);
        match self
            .converter
            .convert(&model, synthesized, &converted)
            .await
        {
            Ok(()) => ConversionOutcome::Converted(converted),
            Err(error) => {
                // Degraded mode: the caller still gets a reply, just not in
                // the cloned character voice. Nothing is emitted about it.
                tracing::warn!(
                    caller = %request.caller,
                    character = %request.character,
                    error = %error,
                    "voice conversion failed, delivering synthesized audio"
                );
                ConversionOutcome::Fallback {
                    audio: synthesized.to_path_buf(),
                    reason: error.to_string(),
                }
            }
        }
    }
}
