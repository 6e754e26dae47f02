use crate::error::Result;
use crate::types::{AudioStream, SpeechInterval};

use super::VoiceActivityDetector;

/// Windowed-energy speech detector.
///
/// A window counts as speech when its mean absolute amplitude exceeds
/// `relative_threshold` times the loudest window of the clip (and the
/// absolute `floor`). Runs of speech windows shorter than `min_speech_ms`
/// are discarded as clicks.
#[derive(Debug, Clone, Copy)]
pub struct EnergyDetector {
    pub window_ms: f64,
    pub min_speech_ms: f64,
    pub relative_threshold: f32,
    pub floor: f32,
}

impl Default for EnergyDetector {
    fn default() -> Self {
        Self {
            window_ms: 20.0,
            min_speech_ms: 60.0,
            relative_threshold: 0.1,
            floor: 1e-3,
        }
    }
}

impl EnergyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    fn window_size(&self, sample_rate: u32) -> usize {
        ((self.window_ms / 1000.0) * sample_rate as f64).max(1.0) as usize
    }
}

impl VoiceActivityDetector for EnergyDetector {
    fn detect(&self, audio: &AudioStream) -> Result<Vec<SpeechInterval>> {
        if audio.samples.is_empty() || audio.sample_rate == 0 {
            return Ok(Vec::new());
        }

        let sample_rate = audio.sample_rate as f64;
        let window_size = self.window_size(audio.sample_rate);
        let min_speech_samples = ((self.min_speech_ms / 1000.0) * sample_rate) as usize;

        let energies: Vec<f32> = audio.samples.chunks(window_size).map(window_energy).collect();
        let peak = energies.iter().copied().fold(0.0_f32, f32::max);
        let threshold = (peak * self.relative_threshold).max(self.floor);

        let mut regions = Vec::new();
        let mut speech_start: Option<usize> = None;
        for (idx, &energy) in energies.iter().enumerate() {
            let offset = idx * window_size;
            if energy > threshold {
                speech_start.get_or_insert(offset);
            } else if let Some(start) = speech_start.take() {
                push_region(&mut regions, start, offset, min_speech_samples, sample_rate);
            }
        }
        if let Some(start) = speech_start {
            push_region(
                &mut regions,
                start,
                audio.samples.len(),
                min_speech_samples,
                sample_rate,
            );
        }

        Ok(regions)
    }
}

fn push_region(
    regions: &mut Vec<SpeechInterval>,
    start: usize,
    end: usize,
    min_samples: usize,
    sample_rate: f64,
) {
    if end.saturating_sub(start) >= min_samples && end > start {
        regions.push(SpeechInterval::new(
            start as f64 / sample_rate,
            end as f64 / sample_rate,
        ));
    }
}

fn window_energy(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f32 = window.iter().map(|sample| sample.abs()).sum();
    sum / window.len() as f32
}
