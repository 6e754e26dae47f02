//! Pitch and loudness variability.

use aus::analysis;
use ndarray::Array1;
use tracing::debug;

use crate::error::{FluencyError, Result, Stage};

use super::statistics::{iqr, quantile_sorted, sorted_finite};

const FREQ_MIN: f64 = 75.0;
const FREQ_MAX: f64 = 400.0;
const FRAME_LENGTH: usize = 2048;
const HOP_LENGTH: usize = 512;
const LOUDNESS_FLOOR: f64 = 1e-8;
const PITCH_CLIP_LOW: f64 = 0.05;
const PITCH_CLIP_HIGH: f64 = 0.95;

/// Frame-wise pitch and loudness of a clip. All three series share one frame grid.
#[derive(Debug, Clone)]
pub struct ProsodyContours {
    /// Fundamental frequency in Hz; NaN or non-positive where undefined
    pub pitch: Array1<f64>,
    pub voiced: Vec<bool>,
    /// Linear RMS amplitude
    pub loudness: Array1<f64>,
}

pub trait PitchAnalyzer: Send + Sync {
    fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<ProsodyContours>;
}

/// pYIN pitch tracker plus an RMS loudness contour.
#[derive(Debug, Clone, Copy)]
pub struct PyinAnalyzer {
    pub fmin: f64,
    pub fmax: f64,
    pub frame_length: usize,
}

impl Default for PyinAnalyzer {
    fn default() -> Self {
        Self {
            fmin: FREQ_MIN,
            fmax: FREQ_MAX,
            frame_length: FRAME_LENGTH,
        }
    }
}

impl PyinAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PitchAnalyzer for PyinAnalyzer {
    fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<ProsodyContours> {
        if samples.len() < self.frame_length {
            return Err(FluencyError::substage(
                Stage::Prosody,
                format!(
                    "clip has {} samples, fewer than one {}-sample analysis frame",
                    samples.len(),
                    self.frame_length
                ),
            ));
        }
        let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let (_timestamps, pitches, voiced_flags, _confidence) = analysis::pyin_pitch_estimator(
            &audio,
            sample_rate,
            self.fmin,
            self.fmax,
            self.frame_length,
        );
        let frame_count = pitches.len().min(voiced_flags.len());
        let rms = rms_contour(&audio, self.frame_length, HOP_LENGTH);
        let loudness = align_to_frames(&rms, frame_count);
        debug!(frame_count, rms_frames = rms.len(), "extracted prosody contours");

        Ok(ProsodyContours {
            pitch: Array1::from(pitches[..frame_count].to_vec()),
            voiced: voiced_flags[..frame_count].to_vec(),
            loudness: Array1::from(loudness),
        })
    }
}

/// Interquartile ranges of voiced pitch (Hz) and voiced loudness (dB).
///
/// Pitch is clipped to its 5th-95th percentile band first so octave errors
/// do not dominate. Loudness is floored before the log.
pub fn prosody_iqrs(contours: &ProsodyContours) -> (f64, f64) {
    let voiced = |idx: usize| contours.voiced.get(idx).copied().unwrap_or(false);

    let voiced_pitch = sorted_finite(
        contours
            .pitch
            .iter()
            .enumerate()
            .filter(|&(idx, &hz)| voiced(idx) && hz > 0.0)
            .map(|(_, &hz)| hz),
    );
    let f0_iqr = if voiced_pitch.is_empty() {
        0.0
    } else {
        let lo = quantile_sorted(&voiced_pitch, PITCH_CLIP_LOW);
        let hi = quantile_sorted(&voiced_pitch, PITCH_CLIP_HIGH);
        let clipped: Vec<f64> = voiced_pitch.iter().map(|hz| hz.clamp(lo, hi)).collect();
        iqr(&clipped)
    };

    let voiced_db: Vec<f64> = contours
        .loudness
        .iter()
        .enumerate()
        .filter(|&(idx, _)| voiced(idx))
        .map(|(_, &rms)| 20.0 * rms.max(LOUDNESS_FLOOR).log10())
        .collect();
    let rms_iqr = iqr(&voiced_db);

    (f0_iqr, rms_iqr)
}

/// Centered RMS frames, `hop` samples apart, each `frame` samples wide.
fn rms_contour(audio: &[f64], frame: usize, hop: usize) -> Vec<f64> {
    if audio.is_empty() || hop == 0 {
        return Vec::new();
    }
    let half = frame / 2;
    let frames = audio.len() / hop + 1;
    (0..frames)
        .map(|idx| {
            let center = idx * hop;
            let start = center.saturating_sub(half);
            let end = (center + half).min(audio.len());
            if end <= start {
                return 0.0;
            }
            // frames reaching past the edges are zero padded
            let energy: f64 = audio[start..end].iter().map(|s| s * s).sum();
            (energy / frame as f64).sqrt()
        })
        .collect()
}

fn align_to_frames(series: &[f64], frame_count: usize) -> Vec<f64> {
    match (frame_count, series.len()) {
        (0, _) => Vec::new(),
        (_, 0) => vec![0.0; frame_count],
        (count, len) if count == len => series.to_vec(),
        (count, len) => interpolate(series, count, len),
    }
}

fn interpolate(series: &[f64], frame_count: usize, len: usize) -> Vec<f64> {
    let denom = (frame_count - 1).max(1) as f64;
    (0..frame_count)
        .map(|frame| {
            let position = frame as f64 * (len - 1) as f64 / denom;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let weight = position - lower as f64;
            series[lower] * (1.0 - weight) + series[upper] * weight
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contours(pitch: Vec<f64>, voiced: Vec<bool>, loudness: Vec<f64>) -> ProsodyContours {
        ProsodyContours {
            pitch: Array1::from(pitch),
            voiced,
            loudness: Array1::from(loudness),
        }
    }

    #[test]
    fn unvoiced_clip_has_flat_prosody() {
        let c = contours(vec![f64::NAN; 4], vec![false; 4], vec![0.1; 4]);
        assert_eq!(prosody_iqrs(&c), (0.0, 0.0));
    }

    #[test]
    fn only_voiced_frames_count() {
        let c = contours(
            vec![100.0, 150.0, 200.0, 250.0, 9000.0],
            vec![true, true, true, true, false],
            vec![1.0, 0.1, 0.01, 0.001, 10.0],
        );
        let (f0, rms) = prosody_iqrs(&c);
        // voiced pitch [100,150,200,250] clipped to [107.5, 242.5]
        assert_relative_eq!(f0, 210.625 - 139.375, epsilon = 1e-9);
        // voiced loudness in dB: [0, -20, -40, -60]
        assert_relative_eq!(rms, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn silent_frames_are_floored_before_log() {
        let c = contours(vec![120.0, 120.0], vec![true, true], vec![0.0, 0.0]);
        let (_, rms) = prosody_iqrs(&c);
        assert_eq!(rms, 0.0);
    }

    #[test]
    fn rms_of_constant_signal_matches_amplitude_inside_clip() {
        let audio = vec![0.5; 8192];
        let rms = rms_contour(&audio, 2048, 512);
        assert_eq!(rms.len(), 8192 / 512 + 1);
        assert_relative_eq!(rms[4], 0.5, epsilon = 1e-9);
        assert!(rms[0] < rms[4]);
    }

    #[test]
    fn alignment_stretches_to_frame_count() {
        let aligned = align_to_frames(&[0.0, 1.0], 3);
        assert_eq!(aligned, vec![0.0, 0.5, 1.0]);
        assert_eq!(align_to_frames(&[], 2), vec![0.0, 0.0]);
    }

    #[test]
    fn short_clip_is_a_prosody_failure() {
        let err = PyinAnalyzer::new().analyze(&[0.0; 100], 16_000).unwrap_err();
        assert!(matches!(
            err,
            FluencyError::Substage {
                stage: Stage::Prosody,
                ..
            }
        ));
    }
}
