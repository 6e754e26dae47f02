//! Rule-based mapping from raw features to sub-scores, composites and a level.
//!
//! Every feature owns an ordered rule table; the first band containing the
//! value decides the sub-score, so overlapping boundaries resolve in table
//! order.

mod rules;

use std::str::FromStr;

use crate::types::{FeatureSet, Level, ScoreResult};

use rules::Rule;

/// Sub-score for a feature name no table covers.
pub const NEUTRAL_SUB_SCORE: f64 = 0.5;

const TIMING_WEIGHTS: [(Metric, f64); 6] = [
    (Metric::SpeechRate, 0.25),
    (Metric::ArticulationRate, 0.20),
    (Metric::PauseRatio, 0.15),
    (Metric::MeanFluentRun, 0.20),
    (Metric::LongPauseFrequency, 0.10),
    (Metric::RateStability, 0.10),
];
const TIMING_SHARE: f64 = 0.70;
const PROSODY_SHARE: f64 = 0.30;

/// A scored feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    SpeechRate,
    ArticulationRate,
    PauseRatio,
    MeanFluentRun,
    LongPauseFrequency,
    RateStability,
    PitchVariability,
    LoudnessVariability,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::SpeechRate => "SR",
            Metric::ArticulationRate => "AR",
            Metric::PauseRatio => "PR",
            Metric::MeanFluentRun => "MLFR",
            Metric::LongPauseFrequency => "LPF",
            Metric::RateStability => "RateSD",
            Metric::PitchVariability => "F0_IQR",
            Metric::LoudnessVariability => "RMS_IQR",
        }
    }

    fn rules(self) -> &'static [Rule] {
        match self {
            Metric::SpeechRate => rules::SPEECH_RATE,
            Metric::ArticulationRate => rules::ARTICULATION_RATE,
            Metric::PauseRatio => rules::PAUSE_RATIO,
            Metric::MeanFluentRun => rules::MEAN_FLUENT_RUN,
            Metric::LongPauseFrequency => rules::LONG_PAUSE_FREQUENCY,
            Metric::RateStability => rules::RATE_STABILITY,
            Metric::PitchVariability => rules::PITCH_VARIABILITY,
            Metric::LoudnessVariability => rules::LOUDNESS_VARIABILITY,
        }
    }

    /// Sub-score in `[0, 1]` for `value`; higher is always more proficient.
    pub fn score(self, value: f64) -> f64 {
        self.rules()
            .iter()
            .find(|rule| rule.band.contains(value))
            .map(|rule| rule.score)
            .unwrap_or(NEUTRAL_SUB_SCORE)
    }

    fn value_in(self, features: &FeatureSet) -> f64 {
        match self {
            Metric::SpeechRate => features.speech_rate,
            Metric::ArticulationRate => features.articulation_rate,
            Metric::PauseRatio => features.pause_ratio,
            Metric::MeanFluentRun => features.mean_fluent_run,
            Metric::LongPauseFrequency => features.long_pause_frequency,
            Metric::RateStability => features.rate_sd,
            Metric::PitchVariability => features.f0_iqr,
            Metric::LoudnessVariability => features.rms_iqr,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric = match s {
            "SR" => Metric::SpeechRate,
            "AR" => Metric::ArticulationRate,
            "PR" => Metric::PauseRatio,
            "MLFR" => Metric::MeanFluentRun,
            "LPF" => Metric::LongPauseFrequency,
            "RateSD" => Metric::RateStability,
            "F0_IQR" => Metric::PitchVariability,
            "RMS_IQR" => Metric::LoudnessVariability,
            other => return Err(format!("unknown metric '{other}'")),
        };
        Ok(metric)
    }
}

/// Sub-score for a feature given by name; unknown names get [`NEUTRAL_SUB_SCORE`].
pub fn score_metric(value: f64, metric_name: &str) -> f64 {
    metric_name
        .parse::<Metric>()
        .map(|metric| metric.score(value))
        .unwrap_or(NEUTRAL_SUB_SCORE)
}

/// Weighted combination of the six timing sub-scores.
pub fn timing_score(features: &FeatureSet) -> f64 {
    TIMING_WEIGHTS
        .iter()
        .map(|&(metric, weight)| weight * metric.score(metric.value_in(features)))
        .sum()
}

/// Equal blend of pitch and loudness variability sub-scores.
pub fn prosody_score(features: &FeatureSet) -> f64 {
    0.5 * Metric::PitchVariability.score(features.f0_iqr)
        + 0.5 * Metric::LoudnessVariability.score(features.rms_iqr)
}

impl Level {
    /// Band a composite fluency score falls into.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Level::Advanced
        } else if score >= 0.50 {
            Level::Intermediate
        } else if score >= 0.30 {
            Level::Basic
        } else {
            Level::BelowBasic
        }
    }
}

/// Score a feature set; `use_prosody` folds the prosody composite in at 30%.
pub fn score(features: &FeatureSet, use_prosody: bool, n_words: usize, duration: f64) -> ScoreResult {
    let timing = timing_score(features);
    let (fluency, prosody) = if use_prosody {
        let prosody = prosody_score(features);
        (TIMING_SHARE * timing + PROSODY_SHARE * prosody, Some(prosody))
    } else {
        (timing, None)
    };

    ScoreResult {
        fluency,
        level: Level::from_score(fluency),
        timing_score: timing,
        prosody_score: prosody,
        n_words,
        duration,
        features: *features,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rate_stability_boundary_is_inclusive() {
        assert_eq!(score_metric(29.0, "RateSD"), 1.0);
        assert_eq!(score_metric(30.0, "RateSD"), 1.0);
        assert_eq!(score_metric(31.0, "RateSD"), 0.8);
        assert_eq!(score_metric(81.0, "RateSD"), 0.1);
    }

    #[test]
    fn unknown_metric_is_neutral() {
        assert_eq!(score_metric(100.0, "Tempo"), NEUTRAL_SUB_SCORE);
    }

    #[test]
    fn speech_and_articulation_rate_ladders() {
        let sr: Vec<f64> = [170.0, 150.0, 130.0, 110.0, 90.0, 50.0]
            .iter()
            .map(|&v| score_metric(v, "SR"))
            .collect();
        assert_eq!(sr, vec![1.0, 0.9, 0.7, 0.5, 0.3, 0.1]);
        assert_eq!(score_metric(160.0, "SR"), 1.0);
        assert_eq!(score_metric(79.999, "SR"), 0.1);

        let ar: Vec<f64> = [180.0, 160.0, 140.0, 120.0, 100.0, 99.0]
            .iter()
            .map(|&v| score_metric(v, "AR"))
            .collect();
        assert_eq!(ar, vec![1.0, 0.9, 0.7, 0.5, 0.3, 0.1]);
    }

    #[test]
    fn pause_ratio_prefers_the_middle_band() {
        assert_eq!(score_metric(0.15, "PR"), 1.0);
        assert_eq!(score_metric(0.25, "PR"), 1.0);
        assert_eq!(score_metric(0.12, "PR"), 0.8);
        assert_eq!(score_metric(0.30, "PR"), 0.8);
        assert_eq!(score_metric(0.33, "PR"), 0.6);
        assert_eq!(score_metric(0.40, "PR"), 0.4);
        assert_eq!(score_metric(0.45, "PR"), 0.2);
        assert_eq!(score_metric(0.05, "PR"), 0.1);
        assert_eq!(score_metric(0.0, "PR"), 0.1);
        assert_eq!(score_metric(0.9, "PR"), 0.1);
    }

    #[test]
    fn run_length_and_long_pause_ladders() {
        assert_eq!(score_metric(10.0, "MLFR"), 1.0);
        assert_eq!(score_metric(8.5, "MLFR"), 0.8);
        assert_eq!(score_metric(6.0, "MLFR"), 0.6);
        assert_eq!(score_metric(5.5, "MLFR"), 0.4);
        assert_eq!(score_metric(3.0, "MLFR"), 0.2);
        assert_eq!(score_metric(2.9, "MLFR"), 0.1);

        assert_eq!(score_metric(2.0, "LPF"), 1.0);
        assert_eq!(score_metric(2.3, "LPF"), 0.8);
        assert_eq!(score_metric(4.0, "LPF"), 0.6);
        assert_eq!(score_metric(5.0, "LPF"), 0.4);
        assert_eq!(score_metric(7.0, "LPF"), 0.2);
        assert_eq!(score_metric(7.5, "LPF"), 0.1);
    }

    #[test]
    fn prosody_ladders_reward_moderate_variation() {
        assert_eq!(score_metric(55.0, "F0_IQR"), 1.0);
        assert_eq!(score_metric(35.0, "F0_IQR"), 0.7);
        assert_eq!(score_metric(85.0, "F0_IQR"), 0.7);
        assert_eq!(score_metric(25.0, "F0_IQR"), 0.5);
        assert_eq!(score_metric(100.0, "F0_IQR"), 0.5);
        assert_eq!(score_metric(10.0, "F0_IQR"), 0.3);
        assert_eq!(score_metric(150.0, "F0_IQR"), 0.3);

        assert_eq!(score_metric(10.5, "RMS_IQR"), 1.0);
        assert_eq!(score_metric(7.0, "RMS_IQR"), 0.7);
        assert_eq!(score_metric(16.0, "RMS_IQR"), 0.7);
        assert_eq!(score_metric(5.0, "RMS_IQR"), 0.5);
        assert_eq!(score_metric(19.0, "RMS_IQR"), 0.5);
        assert_eq!(score_metric(0.0, "RMS_IQR"), 0.3);
    }

    #[test]
    fn nan_falls_through_to_the_floor() {
        assert_eq!(score_metric(f64::NAN, "SR"), 0.1);
        assert_eq!(score_metric(f64::NAN, "F0_IQR"), 0.3);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(Level::from_score(0.75), Level::Advanced);
        assert_eq!(Level::from_score(0.74999), Level::Intermediate);
        assert_eq!(Level::from_score(0.5), Level::Intermediate);
        assert_eq!(Level::from_score(0.3), Level::Basic);
        assert_eq!(Level::from_score(0.29), Level::BelowBasic);
        assert_eq!(Level::from_score(0.0), Level::BelowBasic);
    }

    #[test]
    fn timing_weights_sum_to_one() {
        let total: f64 = TIMING_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn prosody_blend_is_seventy_thirty() {
        let features = FeatureSet {
            speech_rate: 170.0,
            articulation_rate: 190.0,
            pause_ratio: 0.2,
            long_pause_frequency: 1.0,
            mean_fluent_run: 12.0,
            rate_sd: 10.0,
            f0_iqr: 10.0,
            rms_iqr: 10.0,
        };
        let result = score(&features, true, 80, 30.0);
        assert_relative_eq!(result.timing_score, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.prosody_score.unwrap(), 0.65, epsilon = 1e-12);
        assert_relative_eq!(result.fluency, 0.7 + 0.3 * 0.65, epsilon = 1e-12);
        assert_eq!(result.level, Level::Advanced);
    }

    #[test]
    fn without_prosody_fluency_is_timing() {
        let result = score(&FeatureSet::default(), false, 0, 10.0);
        assert_eq!(result.prosody_score, None);
        assert_eq!(result.fluency, result.timing_score);
        // SR 0.1, AR 0.1, PR 0.1, MLFR 0.1, LPF 1.0, RateSD 1.0
        assert_relative_eq!(result.fluency, 0.08 + 0.2, epsilon = 1e-12);
        assert_eq!(result.level, Level::BelowBasic);
    }
}
