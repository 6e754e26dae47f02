//! Voice activity segmentation.
//!
//! A [`VoiceActivityDetector`] emits raw speech regions; [`segment`] turns
//! them into the canonical sorted, merged interval list the feature
//! extractor consumes.

mod energy;

pub use energy::EnergyDetector;

use tracing::debug;

use crate::error::Result;
use crate::types::{AudioStream, SilenceInterval, SpeechInterval};

/// Regions separated by less than this many seconds are treated as one.
pub const MERGE_GAP_SECONDS: f64 = 0.15;

/// Speech / non-speech detector over a loaded clip.
pub trait VoiceActivityDetector: Send + Sync {
    fn detect(&self, audio: &AudioStream) -> Result<Vec<SpeechInterval>>;
}

/// Run `detector` and normalise its timeline into merged speech intervals
/// lying inside `[0, audio.duration_seconds]`.
pub fn segment(
    detector: &dyn VoiceActivityDetector,
    audio: &AudioStream,
) -> Result<Vec<SpeechInterval>> {
    let raw = detector.detect(audio)?;
    let raw_count = raw.len();
    let merged = merge_close_intervals(clamp_to_clip(raw, audio.duration_seconds));
    debug!(raw_count, merged_count = merged.len(), "segmented speech");
    Ok(merged)
}

/// Trim intervals to `[0, total]`, dropping any left empty.
///
/// Detectors work on the resampled buffer, which can run a fraction of a
/// sample past the source clip's duration.
pub fn clamp_to_clip(intervals: Vec<SpeechInterval>, total: f64) -> Vec<SpeechInterval> {
    intervals
        .into_iter()
        .map(|interval| SpeechInterval::new(interval.start.max(0.0), interval.end.min(total)))
        .filter(|interval| interval.end > interval.start)
        .collect()
}

/// Sort by start and fold together neighbours whose gap is under
/// [`MERGE_GAP_SECONDS`]. Single pass; applying it to its own output is a no-op.
pub fn merge_close_intervals(mut intervals: Vec<SpeechInterval>) -> Vec<SpeechInterval> {
    intervals.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
    let mut merged: Vec<SpeechInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start - last.end < MERGE_GAP_SECONDS => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Complement of `speech` within `[0, total]`.
pub fn silences_from_speech(speech: &[SpeechInterval], total: f64) -> Vec<SilenceInterval> {
    let (first, last) = match (speech.first(), speech.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return vec![SilenceInterval {
                start: 0.0,
                end: total,
            }]
        }
    };

    let mut silences = Vec::new();
    if first.start > 0.0 {
        silences.push(SilenceInterval {
            start: 0.0,
            end: first.start,
        });
    }
    for pair in speech.windows(2) {
        if pair[1].start > pair[0].end {
            silences.push(SilenceInterval {
                start: pair[0].end,
                end: pair[1].start,
            });
        }
    }
    if last.end < total {
        silences.push(SilenceInterval {
            start: last.end,
            end: total,
        });
    }
    silences
}

/// Total seconds covered by speech.
pub fn speech_time(speech: &[SpeechInterval]) -> f64 {
    speech.iter().map(|interval| interval.duration()).sum()
}
