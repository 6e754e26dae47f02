pub mod prosody;
pub mod statistics;
pub mod timing;

use crate::types::{FeatureSet, SpeechInterval, Word};
use crate::vad;

pub use prosody::{prosody_iqrs, PitchAnalyzer, ProsodyContours, PyinAnalyzer};

/// Default minimum silence, in seconds, counted as a long pause.
pub const DEFAULT_LONG_PAUSE_SEC: f64 = 0.7;
/// Default inter-word gap, in seconds, that ends a fluent run.
pub const DEFAULT_MLFR_PAUSE_SEC: f64 = 0.25;

/// Timing features plus the clean word count they were computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingFeatures {
    pub features: FeatureSet,
    pub n_words: usize,
}

/// Derives [`FeatureSet`] values from segmenter and aligner output.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    long_pause_sec: f64,
    mlfr_pause_sec: f64,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PAUSE_SEC, DEFAULT_MLFR_PAUSE_SEC)
    }
}

impl FeatureExtractor {
    pub fn new(long_pause_sec: f64, mlfr_pause_sec: f64) -> Self {
        Self {
            long_pause_sec,
            mlfr_pause_sec,
        }
    }

    /// Compute the six timing features for a clip of `duration` seconds.
    ///
    /// `speech` is `None` when voice activity detection was unavailable; the
    /// whole clip then counts as speech. Non-lexical tokens are dropped from
    /// `words` before anything is counted. Prosody fields are left at zero.
    pub fn timing(
        &self,
        duration: f64,
        speech: Option<&[SpeechInterval]>,
        words: &[Word],
    ) -> TimingFeatures {
        let (speech_time, silences) = match speech {
            Some(intervals) => (
                vad::speech_time(intervals),
                vad::silences_from_speech(intervals, duration),
            ),
            None => (duration, Vec::new()),
        };

        let clean = clean_words(words);
        let n_words = clean.len();

        let articulation_rate = if speech_time > 0.0 {
            timing::words_per_minute(n_words, speech_time)
        } else {
            0.0
        };
        let long_pause_frequency = if n_words > 0 {
            timing::long_pause_frequency(&silences, self.long_pause_sec, duration)
        } else {
            0.0
        };

        TimingFeatures {
            features: FeatureSet {
                speech_rate: timing::words_per_minute(n_words, duration),
                articulation_rate,
                pause_ratio: timing::pause_ratio(duration, speech_time),
                long_pause_frequency,
                mean_fluent_run: timing::mean_length_of_fluent_run(&clean, self.mlfr_pause_sec),
                rate_sd: timing::rate_stability(&clean, timing::RATE_WINDOW_SECONDS),
                f0_iqr: 0.0,
                rms_iqr: 0.0,
            },
            n_words,
        }
    }
}

/// Words whose text contains at least one alphabetic character.
pub fn clean_words(words: &[Word]) -> Vec<Word> {
    words.iter().filter(|w| w.is_lexical()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn missing_vad_treats_clip_as_speech() {
        let words = vec![Word::new("hi", 0.0, 0.4), Word::new("there", 2.0, 2.4)];
        let timing = FeatureExtractor::default().timing(6.0, None, &words);
        assert_eq!(timing.features.pause_ratio, 0.0);
        assert_eq!(timing.features.long_pause_frequency, 0.0);
        assert_relative_eq!(timing.features.articulation_rate, 20.0);
        assert_relative_eq!(timing.features.speech_rate, 20.0);
    }

    #[test]
    fn punctuation_tokens_are_not_words() {
        let words = vec![
            Word::new("Well", 0.0, 0.3),
            Word::new(",", 0.3, 0.3),
            Word::new("yes", 0.4, 0.6),
            Word::new("...", 0.6, 0.7),
        ];
        let speech = [SpeechInterval::new(0.0, 1.0)];
        let timing = FeatureExtractor::default().timing(2.0, Some(&speech), &words);
        assert_eq!(timing.n_words, 2);
        assert_relative_eq!(timing.features.pause_ratio, 0.5);
        assert_relative_eq!(timing.features.articulation_rate, 120.0);
        assert_relative_eq!(timing.features.long_pause_frequency, 30.0);
        assert_eq!(timing.features.mean_fluent_run, 2.0);
    }

    #[test]
    fn no_words_zeroes_word_features() {
        let speech = [SpeechInterval::new(1.0, 2.0)];
        let timing = FeatureExtractor::default().timing(4.0, Some(&speech), &[]);
        assert_eq!(timing.n_words, 0);
        assert_eq!(timing.features.speech_rate, 0.0);
        assert_eq!(timing.features.articulation_rate, 0.0);
        assert_eq!(timing.features.long_pause_frequency, 0.0);
        assert_eq!(timing.features.mean_fluent_run, 0.0);
        assert_eq!(timing.features.rate_sd, 0.0);
        assert_relative_eq!(timing.features.pause_ratio, 0.75);
    }
}
