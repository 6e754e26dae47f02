//! Scripted stand-ins for the model-backed stages.
//!
//! These let the pipeline run without model weights: plug them into
//! [`FluencyEvaluatorBuilder`](crate::pipeline::FluencyEvaluatorBuilder) to
//! replay fixed detector, recognizer and pitch outputs.

use ndarray::Array1;

use crate::asr::SpeechRecognizer;
use crate::error::{FluencyError, Result, Stage};
use crate::features::{PitchAnalyzer, ProsodyContours};
use crate::types::{AudioStream, FeatureSet, SpeechInterval, Word};
use crate::vad::VoiceActivityDetector;

/// Detector returning the same speech intervals for every clip.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    intervals: Vec<SpeechInterval>,
}

impl ScriptedDetector {
    pub fn new(intervals: Vec<SpeechInterval>) -> Self {
        Self { intervals }
    }
}

impl VoiceActivityDetector for ScriptedDetector {
    fn detect(&self, _audio: &AudioStream) -> Result<Vec<SpeechInterval>> {
        Ok(self.intervals.clone())
    }
}

/// Recognizer returning a fixed word list.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecognizer {
    words: Vec<Word>,
}

impl ScriptedRecognizer {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// `count` words of `word_len` seconds, back to back from `start` with
    /// `gap` seconds between them.
    pub fn evenly_spaced(count: usize, start: f64, word_len: f64, gap: f64) -> Self {
        let words = (0..count)
            .map(|i| {
                let begin = start + i as f64 * (word_len + gap);
                Word::new(format!("word{i}"), begin, begin + word_len)
            })
            .collect();
        Self { words }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn transcribe(&self, _audio: &AudioStream) -> Result<Vec<Word>> {
        Ok(self.words.clone())
    }
}

/// Pitch analyzer replaying fixed contours.
#[derive(Debug, Clone)]
pub struct ScriptedAnalyzer {
    contours: ProsodyContours,
}

impl ScriptedAnalyzer {
    pub fn new(contours: ProsodyContours) -> Self {
        Self { contours }
    }

    /// Fully voiced contours with the given pitch (Hz) and RMS values.
    pub fn voiced(pitch: Vec<f64>, loudness: Vec<f64>) -> Self {
        let voiced = vec![true; pitch.len()];
        Self::new(ProsodyContours {
            pitch: Array1::from(pitch),
            voiced,
            loudness: Array1::from(loudness),
        })
    }
}

impl PitchAnalyzer for ScriptedAnalyzer {
    fn analyze(&self, _samples: &[f32], _sample_rate: u32) -> Result<ProsodyContours> {
        Ok(self.contours.clone())
    }
}

/// Stage that always fails, for exercising fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStage;

impl VoiceActivityDetector for FailingStage {
    fn detect(&self, _audio: &AudioStream) -> Result<Vec<SpeechInterval>> {
        Err(FluencyError::substage(Stage::VoiceActivity, "scripted failure"))
    }
}

impl SpeechRecognizer for FailingStage {
    fn transcribe(&self, _audio: &AudioStream) -> Result<Vec<Word>> {
        Err(FluencyError::substage(Stage::Transcription, "scripted failure"))
    }
}

impl PitchAnalyzer for FailingStage {
    fn analyze(&self, _samples: &[f32], _sample_rate: u32) -> Result<ProsodyContours> {
        Err(FluencyError::substage(Stage::Prosody, "scripted failure"))
    }
}

/// Features of a typical advanced 25.4 second answer with 55 clean words.
pub fn reference_features() -> (FeatureSet, usize, f64) {
    let features = FeatureSet {
        speech_rate: 129.9,
        articulation_rate: 165.5,
        pause_ratio: 0.21,
        long_pause_frequency: 2.3,
        mean_fluent_run: 8.5,
        rate_sd: 35.0,
        f0_iqr: 55.0,
        rms_iqr: 10.5,
    };
    (features, 55, 25.4)
}
