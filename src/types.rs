//! Core types for the fluency scoring pipeline

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sample rate every stage downstream of the loader works at.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded clip (mono, f32 samples at [`TARGET_SAMPLE_RATE`])
#[derive(Debug, Clone)]
pub struct AudioStream {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Length of the source clip in seconds
    pub duration_seconds: f64,
}

impl AudioStream {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration_seconds = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };
        Self {
            samples,
            sample_rate,
            duration_seconds,
        }
    }
}

/// Region of detected speech, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechInterval {
    pub start: f64,
    pub end: f64,
}

impl SpeechInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(self) -> f64 {
        self.end - self.start
    }
}

/// Gap between speech regions. Only ever derived from a speech list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
}

impl SilenceInterval {
    pub fn duration(self) -> f64 {
        self.end - self.start
    }
}

/// A recognised word with its timing
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub start: f64, // seconds
    pub end: f64,   // seconds
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Whether the token carries lexical content rather than punctuation or noise.
    pub fn is_lexical(&self) -> bool {
        self.text.chars().any(char::is_alphabetic)
    }
}

/// Scalar timing and prosody measurements for one clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Speech rate, words per minute over the whole clip
    #[serde(rename = "SR")]
    pub speech_rate: f64,
    /// Articulation rate, words per minute of speech time
    #[serde(rename = "AR")]
    pub articulation_rate: f64,
    #[serde(rename = "PR")]
    pub pause_ratio: f64,
    /// Long pauses per minute
    #[serde(rename = "LPF")]
    pub long_pause_frequency: f64,
    /// Mean length of fluent run, in words
    #[serde(rename = "MLFR")]
    pub mean_fluent_run: f64,
    #[serde(rename = "RateSD")]
    pub rate_sd: f64,
    #[serde(rename = "F0_IQR")]
    pub f0_iqr: f64,
    #[serde(rename = "RMS_IQR")]
    pub rms_iqr: f64,
}

impl FeatureSet {
    /// Look a feature up by its short name (`SR`, `AR`, ..., `RMS_IQR`).
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "SR" => self.speech_rate,
            "AR" => self.articulation_rate,
            "PR" => self.pause_ratio,
            "LPF" => self.long_pause_frequency,
            "MLFR" => self.mean_fluent_run,
            "RateSD" => self.rate_sd,
            "F0_IQR" => self.f0_iqr,
            "RMS_IQR" => self.rms_iqr,
            _ => return None,
        };
        Some(value)
    }
}

/// Proficiency band derived from the composite fluency score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Advanced,
    Intermediate,
    Basic,
    #[serde(rename = "Below Basic")]
    BelowBasic,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Advanced => "Advanced",
            Level::Intermediate => "Intermediate",
            Level::Basic => "Basic",
            Level::BelowBasic => "Below Basic",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluation, serialised as a flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "Fluency")]
    pub fluency: f64,
    #[serde(rename = "Level")]
    pub level: Level,
    #[serde(rename = "Timing_Score")]
    pub timing_score: f64,
    #[serde(rename = "Prosody_Score")]
    pub prosody_score: Option<f64>,
    #[serde(rename = "N_words")]
    pub n_words: usize,
    #[serde(rename = "Duration")]
    pub duration: f64,
    #[serde(flatten)]
    pub features: FeatureSet,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResult {
    /// Result reported when the clip itself cannot be used.
    pub fn zero(reason: impl Into<String>) -> Self {
        Self {
            fluency: 0.0,
            level: Level::BelowBasic,
            timing_score: 0.0,
            prosody_score: None,
            n_words: 0,
            duration: 0.0,
            features: FeatureSet::default(),
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_filter_rejects_punctuation() {
        assert!(Word::new("hello,", 0.0, 0.3).is_lexical());
        assert!(!Word::new("...", 0.0, 0.3).is_lexical());
        assert!(!Word::new("-", 0.0, 0.3).is_lexical());
        assert!(Word::new("café", 0.0, 0.3).is_lexical());
    }

    #[test]
    fn score_result_serialises_flat() {
        let result = ScoreResult::zero("Audio file is empty or invalid.");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["Level"], "Below Basic");
        assert_eq!(value["Fluency"], 0.0);
        assert!(value["Prosody_Score"].is_null());
        assert_eq!(value["RateSD"], 0.0);
        assert_eq!(value["Error"], "Audio file is empty or invalid.");
    }

    #[test]
    fn error_key_is_omitted_when_absent() {
        let mut result = ScoreResult::zero("x");
        result.error = None;
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("Error").is_none());
    }

    #[test]
    fn feature_lookup_by_name() {
        let features = FeatureSet {
            rate_sd: 35.0,
            ..FeatureSet::default()
        };
        assert_eq!(features.get("RateSD"), Some(35.0));
        assert_eq!(features.get("Tempo"), None);
    }
}
