//! Word-level speech recognition.

mod whisper;

pub use whisper::{resolve_model_path, WhisperRecognizer};

use crate::error::Result;
use crate::types::{AudioStream, Word};

/// Speech-to-text engine producing per-word timestamps.
///
/// Implementations return every recognised token with surrounding
/// whitespace trimmed, in start-time order. Punctuation-only tokens are
/// left in; the feature extractor drops them.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(&self, audio: &AudioStream) -> Result<Vec<Word>>;
}
