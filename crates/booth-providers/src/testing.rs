//! Deterministic in-process provider doubles.
//!
//! These run the real pipeline without any network access: each double
//! follows a fixed script and counts its invocations so tests can assert
//! single-attempt semantics and prompt assembly.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use booth_characters::ConversionModel;

use crate::completion::{ChatMessage, CompletionProvider};
use crate::conversion::VoiceConverter;
use crate::error::{ProviderError, ProviderResult};
use crate::image_edit::ImageEditor;
use crate::recognition::RecognitionProvider;
use crate::removal::BackgroundRemover;
use crate::synthesis::SynthesisProvider;

#[derive(Debug, Clone)]
enum Script {
    Succeed,
    Transport { status: u16, body: String },
    Fail(String),
}

impl Script {
    fn check(&self, provider: &'static str) -> ProviderResult<()> {
        match self {
            Script::Succeed => Ok(()),
            Script::Transport { status, body } => Err(ProviderError::Transport {
                provider,
                status: *status,
                body: body.clone(),
            }),
            Script::Fail(message) => Err(ProviderError::Request {
                provider,
                message: message.clone(),
            }),
        }
    }
}

/// Scripted speech-to-text double.
#[derive(Debug)]
pub struct ScriptedRecognizer {
    script: Script,
    text: String,
    empty: bool,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            script: Script::Succeed,
            text: text.into(),
            empty: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Recognition succeeds at the transport level but produces no text.
    pub fn empty() -> Self {
        Self {
            script: Script::Succeed,
            text: String::new(),
            empty: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Script::Transport {
                status,
                body: body.into(),
            },
            text: String::new(),
            empty: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionProvider for ScriptedRecognizer {
    async fn recognize(&self, _audio: Vec<u8>) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.check("recognition")?;
        if self.empty {
            return Err(ProviderError::EmptyRecognition);
        }
        Ok(self.text.clone())
    }
}

/// Scripted completion double; captures every message list it receives.
#[derive(Debug)]
pub struct ScriptedCompleter {
    script: Script,
    reply: String,
    calls: AtomicUsize,
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompleter {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            script: Script::Succeed,
            reply: text.into(),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Script::Transport {
                status,
                body: body.into(),
            },
            reply: String::new(),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists observed so far, in call order.
    pub fn received_messages(&self) -> Vec<Vec<ChatMessage>> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompleter {
    async fn complete(&self, messages: Vec<ChatMessage>) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(messages);
        self.script.check("completion")?;
        Ok(self.reply.clone())
    }
}

/// Scripted text-to-speech double.
#[derive(Debug)]
pub struct ScriptedSynthesizer {
    script: Script,
    audio: Vec<u8>,
    calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn audio(audio: Vec<u8>) -> Self {
        Self {
            script: Script::Succeed,
            audio,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Script::Transport {
                status,
                body: body.into(),
            },
            audio: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisProvider for ScriptedSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str) -> ProviderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.check("synthesis")?;
        Ok(self.audio.clone())
    }
}

/// Scripted voice-conversion double; on success it writes `converted` into
/// the requested output path, mimicking the copy-out behavior of the real
/// conversion service.
#[derive(Debug)]
pub struct ScriptedConverter {
    script: Script,
    converted: Vec<u8>,
    calls: AtomicUsize,
}

impl ScriptedConverter {
    pub fn succeed_with(converted: Vec<u8>) -> Self {
        Self {
            script: Script::Succeed,
            converted,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            converted: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Scripted background-removal double.
#[derive(Debug)]
pub struct ScriptedRemover {
    script: Script,
    response: Vec<u8>,
    calls: AtomicUsize,
}

impl ScriptedRemover {
    pub fn succeed_with(response: Vec<u8>) -> Self {
        Self {
            script: Script::Succeed,
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Script::Transport {
                status,
                body: body.into(),
            },
            response: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundRemover for ScriptedRemover {
    async fn remove_background(&self, _png: Vec<u8>) -> ProviderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.check("background-removal")?;
        Ok(self.response.clone())
    }
}

/// Scripted image-edit double; captures every instruction it receives.
#[derive(Debug)]
pub struct ScriptedEditor {
    script: Script,
    response: Vec<u8>,
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    pub fn succeed_with(response: Vec<u8>) -> Self {
        Self {
            script: Script::Succeed,
            response,
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Script::Transport {
                status,
                body: body.into(),
            },
            response: Vec::new(),
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instruction texts observed so far, in call order.
    pub fn received_instructions(&self) -> Vec<String> {
        self.instructions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ImageEditor for ScriptedEditor {
    async fn edit(&self, _png: Vec<u8>, instruction: &str) -> ProviderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(instruction.to_string());
        self.script.check("image-edit")?;
        Ok(self.response.clone())
    }
}

#[async_trait]
impl VoiceConverter for ScriptedConverter {
    async fn convert(
        &self,
        _model: &ConversionModel,
        _input: &Path,
        output: &Path,
    ) -> ProviderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.check("voice-conversion")?;
        tokio::fs::write(output, &self.converted)
            .await
            .map_err(|error| ProviderError::Request {
                provider: "voice-conversion",
                message: format!("failed to write converted audio: {error}"),
            })
    }
}
