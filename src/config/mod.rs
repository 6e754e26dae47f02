use std::fmt;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

use crate::asr;
use crate::features::{DEFAULT_LONG_PAUSE_SEC, DEFAULT_MLFR_PAUSE_SEC};

pub const DEFAULT_VAD_MODEL: &str = "energy";
pub const DEFAULT_ASR_MODEL: &str = "small.en";
pub const DEFAULT_MODELS_DIR: &str = "./models";

pub const ENV_VAD_MODEL: &str = "FLUENCY_VAD_MODEL";
pub const ENV_CREDENTIAL: &str = "FLUENCY_HF_TOKEN";
pub const ENV_ASR_MODEL: &str = "FLUENCY_ASR_MODEL";
pub const ENV_MODELS_DIR: &str = "FLUENCY_MODELS_DIR";
pub const ENV_WHISPER_MODEL_PATH: &str = "WHISPER_MODEL_PATH";

/// Parameters of one fluency evaluation.
#[derive(Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Voice activity model identifier
    pub vad_model_id: String,
    /// Access token for gated detector models
    pub credential: Option<String>,
    /// Whisper model size, e.g. `small.en`
    pub asr_model_size: String,
    pub use_prosody: bool,
    pub long_pause_sec: f64,
    pub mlfr_pause_sec: f64,
    /// Directory holding `ggml-<size>.bin` Whisper weights
    pub models_dir: PathBuf,
    /// Explicit Whisper weights file, bypassing `models_dir`
    pub whisper_model_path: Option<PathBuf>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            vad_model_id: DEFAULT_VAD_MODEL.to_string(),
            credential: None,
            asr_model_size: DEFAULT_ASR_MODEL.to_string(),
            use_prosody: false,
            long_pause_sec: DEFAULT_LONG_PAUSE_SEC,
            mlfr_pause_sec: DEFAULT_MLFR_PAUSE_SEC,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            whisper_model_path: None,
        }
    }
}

impl EvaluationConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the `FLUENCY_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(model) = set(ENV_VAD_MODEL) {
            config.vad_model_id = model;
        }
        config.credential = set(ENV_CREDENTIAL);
        if let Some(model) = set(ENV_ASR_MODEL) {
            config.asr_model_size = model;
        }
        if let Some(dir) = set(ENV_MODELS_DIR) {
            config.models_dir = PathBuf::from(dir);
        }
        config.whisper_model_path = set(ENV_WHISPER_MODEL_PATH).map(PathBuf::from);
        config
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.vad_model_id.trim().is_empty(),
            "VAD model identifier must not be empty"
        );
        ensure!(
            !self.asr_model_size.trim().is_empty(),
            "ASR model size must not be empty"
        );
        ensure!(
            self.long_pause_sec > 0.0,
            "long pause threshold must be positive, got: {}",
            self.long_pause_sec
        );
        ensure!(
            self.mlfr_pause_sec > 0.0,
            "fluent run pause threshold must be positive, got: {}",
            self.mlfr_pause_sec
        );
        if let Some(path) = &self.whisper_model_path {
            ensure!(
                !path.as_os_str().is_empty(),
                "Whisper model path must not be empty"
            );
        }
        Ok(())
    }

    /// Replace both pause thresholds, rejecting non-positive values.
    pub fn with_thresholds(mut self, long_pause_sec: f64, mlfr_pause_sec: f64) -> Result<Self> {
        self.long_pause_sec = long_pause_sec;
        self.mlfr_pause_sec = mlfr_pause_sec;
        self.validate().context("invalid pause thresholds")?;
        Ok(self)
    }

    /// Whisper weights this configuration points at.
    pub fn whisper_weights(&self) -> PathBuf {
        self.whisper_model_path
            .clone()
            .unwrap_or_else(|| asr::resolve_model_path(&self.models_dir, &self.asr_model_size))
    }
}

impl fmt::Debug for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationConfig")
            .field("vad_model_id", &self.vad_model_id)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("asr_model_size", &self.asr_model_size)
            .field("use_prosody", &self.use_prosody)
            .field("long_pause_sec", &self.long_pause_sec)
            .field("mlfr_pause_sec", &self.mlfr_pause_sec)
            .field("models_dir", &self.models_dir)
            .field("whisper_model_path", &self.whisper_model_path)
            .finish()
    }
}
