//! Oral fluency scoring for spoken English answers.
//!
//! A clip is decoded, segmented into speech and silence, transcribed with
//! word timestamps, reduced to timing and prosody features, and scored
//! against fixed rule tables into a composite fluency score and level.

pub mod asr;
pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod scoring;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod vad;

pub use config::EvaluationConfig;
pub use error::{FluencyError, Result, Stage};
pub use pipeline::{evaluate_fluency, FluencyEvaluator, FluencyEvaluatorBuilder};
pub use scoring::score_metric;
pub use types::{AudioStream, FeatureSet, Level, ScoreResult, SpeechInterval, Word};
