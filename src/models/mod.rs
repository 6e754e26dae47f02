//! Shared, lazily loaded model instances.
//!
//! Loading a detector or recognizer is expensive, so instances are cached by
//! model identifier and handed out as `Arc`s. Each identifier has its own
//! slot lock: concurrent callers asking for the same model wait for a single
//! load, callers asking for different models do not block each other. A
//! failed load leaves the slot empty so the next call retries.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::asr::{SpeechRecognizer, WhisperRecognizer};
use crate::error::{FluencyError, Result, Stage};
use crate::vad::{EnergyDetector, VoiceActivityDetector};

/// Voice activity model identifiers this build can construct.
pub const KNOWN_VAD_MODELS: &[&str] = &["energy"];

/// Keyed once-per-key cache.
pub struct ModelCache<T: ?Sized> {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<Arc<T>>>>>>,
}

impl<T: ?Sized> Default for ModelCache<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> ModelCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached instance for `key`, running `init` only if none is stored yet.
    pub fn get_or_try_init<F>(&self, key: &str, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<Arc<T>>,
    {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let mut guard = lock(&slot);
        if let Some(model) = guard.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = init()?;
        *guard = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Number of keys holding a loaded instance.
    pub fn loaded(&self) -> usize {
        let slots: Vec<Arc<Mutex<Option<Arc<T>>>>> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic inside a loader cannot leave a half-written slot behind.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Detector and recognizer caches shared across evaluations.
#[derive(Default)]
pub struct ModelRegistry {
    detectors: ModelCache<dyn VoiceActivityDetector>,
    recognizers: ModelCache<dyn SpeechRecognizer>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> Arc<ModelRegistry> {
        static GLOBAL: OnceLock<Arc<ModelRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ModelRegistry::new())))
    }

    pub fn detector(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn VoiceActivityDetector>> {
        self.detectors.get_or_try_init(model_id, || {
            debug!(
                model = model_id,
                has_credential = credential.is_some(),
                "loading voice activity model"
            );
            let detector: Arc<dyn VoiceActivityDetector> = match model_id {
                "energy" => Arc::new(EnergyDetector::new()),
                other => {
                    return Err(FluencyError::substage(
                        Stage::VoiceActivity,
                        format!(
                            "unknown voice activity model '{other}' (available: {})",
                            KNOWN_VAD_MODELS.join(", ")
                        ),
                    ))
                }
            };
            info!(model = model_id, "voice activity model ready");
            Ok(detector)
        })
    }

    /// Recognizer for `model_size`, loading weights from `weights` on first use.
    pub fn recognizer(&self, model_size: &str, weights: &Path) -> Result<Arc<dyn SpeechRecognizer>> {
        let key = format!("{model_size}@{}", weights.display());
        self.recognizers.get_or_try_init(&key, || {
            let recognizer: Arc<dyn SpeechRecognizer> =
                Arc::new(WhisperRecognizer::load(weights, model_size)?);
            Ok(recognizer)
        })
    }

    pub fn loaded_detectors(&self) -> usize {
        self.detectors.loaded()
    }

    pub fn loaded_recognizers(&self) -> usize {
        self.recognizers.loaded()
    }
}
