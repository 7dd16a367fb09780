//! External-service adapters for the booth backends.
//!
//! Every computational step is delegated to an outside service; this crate
//! holds the trait seams the pipeline depends on plus HTTP implementations
//! for each collaborator: speech recognition, chat completion, speech
//! synthesis, voice conversion (loopback RVC), background removal (loopback
//! rembg-shaped service), and hosted generative image edit. Deterministic
//! doubles for tests live in [`testing`].
//!
//! Calls are single-attempt by design: a transient upstream failure surfaces
//! immediately instead of being masked by retries.

mod completion;
mod conversion;
mod error;
mod image_edit;
mod recognition;
mod removal;
mod synthesis;
pub mod testing;

pub use completion::{
    ChatMessage, CompletionProvider, SpeechKitCompleter, SpeechKitCompleterConfig,
};
pub use conversion::{RvcConverter, RvcConverterConfig, VoiceConverter};
pub use error::{ProviderError, ProviderResult};
pub use image_edit::{ImageEditor, OpenRouterImageEditor, OpenRouterImageEditorConfig};
pub use recognition::{RecognitionProvider, SpeechKitRecognizer, SpeechKitRecognizerConfig};
pub use removal::{BackgroundRemover, HttpBackgroundRemover, HttpBackgroundRemoverConfig};
pub use synthesis::{SpeechKitSynthesizer, SpeechKitSynthesizerConfig, SynthesisProvider};

/// Timeout for recognition, synthesis, model selection, and removal calls.
pub const SHORT_CALL_TIMEOUT_MS: u64 = 30_000;
/// Timeout for completion and conversion calls, which do heavier work.
pub const LONG_CALL_TIMEOUT_MS: u64 = 120_000;
