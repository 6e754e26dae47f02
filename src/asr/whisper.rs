//! Whisper-backed recognizer.
//!
//! whisper.cpp is asked for one word per segment (token timestamps, split on
//! word boundaries, max segment length 1), so segment timing is word timing.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::error::{FluencyError, Result, Stage};
use crate::types::{AudioStream, Word, TARGET_SAMPLE_RATE};

use super::SpeechRecognizer;

const BEAM_SIZE: i32 = 5;

/// Location of the ggml weights for `model_size` (e.g. `small.en`) under `models_dir`.
pub fn resolve_model_path(models_dir: &Path, model_size: &str) -> PathBuf {
    models_dir.join(format!("ggml-{model_size}.bin"))
}

/// Decoding language for a model size: English for English-only sizes,
/// `None` (auto-detect) otherwise.
fn decode_language(model_size: &str) -> Option<&'static str> {
    model_size.contains("en").then_some("en")
}

pub struct WhisperRecognizer {
    ctx: WhisperContext,
    model_size: String,
}

impl WhisperRecognizer {
    /// Load weights from `model_path`. `model_size` selects English-only decoding
    /// when it names an `.en` model.
    pub fn load(model_path: &Path, model_size: impl Into<String>) -> Result<Self> {
        let model_size = model_size.into();
        if !model_path.is_file() {
            return Err(FluencyError::substage(
                Stage::Transcription,
                format!(
                    "Whisper model not found at {}. Download ggml-{}.bin from https://huggingface.co/ggerganov/whisper.cpp",
                    model_path.display(),
                    model_size
                ),
            ));
        }
        let path_str = model_path.to_str().ok_or_else(|| {
            FluencyError::substage(
                Stage::Transcription,
                format!("model path {:?} is not valid UTF-8", model_path),
            )
        })?;
        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|err| {
                FluencyError::substage(
                    Stage::Transcription,
                    format!(
                        "failed to load Whisper model {}: {err}. Download ggml-{}.bin from https://huggingface.co/ggerganov/whisper.cpp",
                        model_path.display(),
                        model_size
                    ),
                )
            })?;
        info!(model = %model_size, path = %model_path.display(), "loaded Whisper model");
        Ok(Self { ctx, model_size })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &AudioStream) -> Result<Vec<Word>> {
        if audio.sample_rate != TARGET_SAMPLE_RATE {
            return Err(FluencyError::substage(
                Stage::Transcription,
                format!(
                    "Whisper expects {} Hz input, got {} Hz",
                    TARGET_SAMPLE_RATE, audio.sample_rate
                ),
            ));
        }

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: BEAM_SIZE,
            patience: -1.0,
        });
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(true);
        params.set_split_on_word(true);
        params.set_max_len(1);
        params.set_language(decode_language(&self.model_size));

        let mut state = self
            .ctx
            .create_state()
            .map_err(|err| FluencyError::substage(Stage::Transcription, err))?;
        state
            .full(params, &audio.samples)
            .map_err(|err| FluencyError::substage(Stage::Transcription, err))?;

        let mut words = Vec::new();
        for segment in state.as_iter() {
            let text = segment
                .to_str()
                .map_err(|err| FluencyError::substage(Stage::Transcription, err))?
                .trim();
            if text.is_empty() {
                continue;
            }
            // Timestamps are in centiseconds
            let start = segment.start_timestamp() as f64 / 100.0;
            let end = segment.end_timestamp() as f64 / 100.0;
            words.push(Word::new(text, start, end.max(start)));
        }
        debug!(words = words.len(), model = %self.model_size, "transcribed clip");

        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_follows_ggml_naming() {
        let path = resolve_model_path(Path::new("models"), "small.en");
        assert_eq!(path, Path::new("models").join("ggml-small.en.bin"));
    }

    #[test]
    fn only_english_sizes_force_english() {
        assert_eq!(decode_language("small.en"), Some("en"));
        assert_eq!(decode_language("base.en"), Some("en"));
        assert_eq!(decode_language("medium"), None);
        assert_eq!(decode_language("large-v3"), None);
    }

    #[test]
    fn missing_weights_are_a_transcription_failure() {
        let err = WhisperRecognizer::load(Path::new("models/ggml-missing.bin"), "missing")
            .err()
            .expect("loading absent weights fails");
        assert!(matches!(
            err,
            FluencyError::Substage {
                stage: Stage::Transcription,
                ..
            }
        ));
    }
}
