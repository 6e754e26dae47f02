//! Evaluation orchestrator.
//!
//! Stages run in a fixed order: load audio, detect voice activity,
//! transcribe, extract features, score. Only loading can end an evaluation
//! early (with a zero score); detection, transcription and prosody failures
//! are logged and replaced by defaults so a complete result always comes
//! back.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::asr::SpeechRecognizer;
use crate::audio;
use crate::config::EvaluationConfig;
use crate::error::{FluencyError, Result};
use crate::features::{prosody_iqrs, FeatureExtractor, PitchAnalyzer, PyinAnalyzer};
use crate::models::ModelRegistry;
use crate::scoring;
use crate::types::{AudioStream, ScoreResult, SpeechInterval, Word};
use crate::vad::{self, VoiceActivityDetector};

/// Message attached to results for clips that could not be used.
pub const INVALID_AUDIO_MESSAGE: &str = "Audio file is empty or invalid.";

pub struct FluencyEvaluatorBuilder {
    config: EvaluationConfig,
    registry: Option<Arc<ModelRegistry>>,
    detector: Option<Arc<dyn VoiceActivityDetector>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pitch_analyzer: Option<Arc<dyn PitchAnalyzer>>,
}

impl FluencyEvaluatorBuilder {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            config,
            registry: None,
            detector: None,
            recognizer: None,
            pitch_analyzer: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use `detector` instead of looking `vad_model_id` up in the registry.
    pub fn with_detector(mut self, detector: Arc<dyn VoiceActivityDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Use `recognizer` instead of loading Whisper weights.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_pitch_analyzer(mut self, analyzer: Arc<dyn PitchAnalyzer>) -> Self {
        self.pitch_analyzer = Some(analyzer);
        self
    }

    pub fn build(self) -> FluencyEvaluator {
        let extractor =
            FeatureExtractor::new(self.config.long_pause_sec, self.config.mlfr_pause_sec);
        FluencyEvaluator {
            registry: self.registry.unwrap_or_else(ModelRegistry::global),
            detector: self.detector,
            recognizer: self.recognizer,
            pitch_analyzer: self
                .pitch_analyzer
                .unwrap_or_else(|| Arc::new(PyinAnalyzer::new())),
            extractor,
            config: self.config,
        }
    }
}

/// Runs the fluency pipeline over audio files.
///
/// Holds no per-evaluation state, so one evaluator can serve many calls,
/// including concurrent ones.
pub struct FluencyEvaluator {
    config: EvaluationConfig,
    registry: Arc<ModelRegistry>,
    detector: Option<Arc<dyn VoiceActivityDetector>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pitch_analyzer: Arc<dyn PitchAnalyzer>,
    extractor: FeatureExtractor,
}

impl FluencyEvaluator {
    /// Evaluator backed by the global model registry.
    pub fn new(config: EvaluationConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: EvaluationConfig) -> FluencyEvaluatorBuilder {
        FluencyEvaluatorBuilder::new(config)
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score the clip at `path`. Never fails: unusable input yields a zero score.
    pub fn evaluate<P: AsRef<Path>>(&self, path: P) -> ScoreResult {
        let path = path.as_ref();
        match self.try_evaluate(path) {
            Ok(result) => result,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rejecting audio input");
                ScoreResult::zero(INVALID_AUDIO_MESSAGE)
            }
        }
    }

    /// Score the clip at `path`, surfacing input errors instead of masking them.
    pub fn try_evaluate<P: AsRef<Path>>(&self, path: P) -> Result<ScoreResult> {
        let path = path.as_ref();
        let audio = audio::load_audio(path)?;
        if audio.duration_seconds <= 0.0 {
            return Err(FluencyError::input(path, INVALID_AUDIO_MESSAGE));
        }
        info!(
            path = %path.display(),
            duration_seconds = audio.duration_seconds,
            "evaluating fluency"
        );
        Ok(self.evaluate_stream(&audio))
    }

    /// Score an already loaded clip.
    pub fn evaluate_stream(&self, audio: &AudioStream) -> ScoreResult {
        if audio.samples.is_empty() || audio.duration_seconds <= 0.0 {
            return ScoreResult::zero(INVALID_AUDIO_MESSAGE);
        }
        let duration = audio.duration_seconds;

        let speech = match self.detect_voice_activity(audio) {
            Ok(speech) => Some(speech),
            Err(err) => {
                warn!(error = %err, "voice activity detection unavailable; treating whole clip as speech");
                None
            }
        };

        let words = match self.transcribe_words(audio) {
            Ok(words) => words,
            Err(err) => {
                warn!(error = %err, "transcription unavailable; scoring with no words");
                Vec::new()
            }
        };

        let timing = self.extractor.timing(duration, speech.as_deref(), &words);
        let mut features = timing.features;
        if self.config.use_prosody {
            match self.pitch_analyzer.analyze(&audio.samples, audio.sample_rate) {
                Ok(contours) => {
                    let (f0_iqr, rms_iqr) = prosody_iqrs(&contours);
                    features.f0_iqr = f0_iqr;
                    features.rms_iqr = rms_iqr;
                }
                Err(err) => warn!(error = %err, "prosody analysis failed; using flat prosody"),
            }
        }

        let result = scoring::score(&features, self.config.use_prosody, timing.n_words, duration);
        info!(
            fluency = result.fluency,
            level = %result.level,
            n_words = result.n_words,
            "fluency scored"
        );
        result
    }

    /// Score audio received as raw bytes (an upload), staging it in a temp file.
    ///
    /// `extension` is the container hint, e.g. `wav` or `mp3`. The temp file is
    /// removed once evaluation finishes, whatever the outcome.
    pub fn evaluate_bytes(&self, bytes: &[u8], extension: &str) -> ScoreResult {
        let staged = tempfile::Builder::new()
            .prefix("fluency-upload-")
            .suffix(&format!(".{}", extension.trim_start_matches('.')))
            .tempfile()
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.flush()?;
                Ok(file)
            });
        match staged {
            Ok(file) => self.evaluate(file.path()),
            Err(err) => {
                warn!(error = %err, "failed to stage uploaded audio");
                ScoreResult::zero(INVALID_AUDIO_MESSAGE)
            }
        }
    }

    /// Score several clips one after another.
    pub fn evaluate_batch<I, P>(&self, paths: I) -> Vec<(PathBuf, ScoreResult)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let result = self.evaluate(&path);
                (path, result)
            })
            .collect()
    }

    fn detect_voice_activity(&self, audio: &AudioStream) -> Result<Vec<SpeechInterval>> {
        let detector = match &self.detector {
            Some(detector) => Arc::clone(detector),
            None => self
                .registry
                .detector(&self.config.vad_model_id, self.config.credential.as_deref())?,
        };
        vad::segment(detector.as_ref(), audio)
    }

    fn transcribe_words(&self, audio: &AudioStream) -> Result<Vec<Word>> {
        let recognizer = match &self.recognizer {
            Some(recognizer) => Arc::clone(recognizer),
            None => self
                .registry
                .recognizer(&self.config.asr_model_size, &self.config.whisper_weights())?,
        };
        recognizer.transcribe(audio)
    }
}

/// Score one clip with the global model registry.
pub fn evaluate_fluency<P: AsRef<Path>>(audio_path: P, config: &EvaluationConfig) -> ScoreResult {
    FluencyEvaluator::new(config.clone()).evaluate(audio_path)
}
