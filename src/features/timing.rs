//! Timing features derived from speech intervals and word timestamps.

use crate::types::{SilenceInterval, Word};

use super::statistics::sample_std_dev;

const MIN_DURATION: f64 = 1e-6;

/// Width of the windows used for rate stability.
pub const RATE_WINDOW_SECONDS: f64 = 5.0;

/// Words per minute over `seconds`; `0.0` for a vanishing span.
pub fn words_per_minute(n_words: usize, seconds: f64) -> f64 {
    if seconds <= MIN_DURATION {
        0.0
    } else {
        n_words as f64 / (seconds / 60.0)
    }
}

/// Fraction of the clip not covered by speech.
pub fn pause_ratio(total: f64, speech_time: f64) -> f64 {
    if total <= MIN_DURATION {
        0.0
    } else {
        (total - speech_time) / total
    }
}

/// Silences of at least `min_long` seconds, per minute of clip.
pub fn long_pause_frequency(silences: &[SilenceInterval], min_long: f64, total: f64) -> f64 {
    if total <= MIN_DURATION {
        return 0.0;
    }
    let long_pauses = silences
        .iter()
        .filter(|silence| silence.duration() >= min_long)
        .count();
    long_pauses as f64 / (total / 60.0)
}

/// Mean number of words per fluent run.
///
/// A run breaks wherever the gap between a word's start and the previous
/// word's end reaches `pause_threshold`.
pub fn mean_length_of_fluent_run(words: &[Word], pause_threshold: f64) -> f64 {
    let ordered = sorted_by_start(words);
    if ordered.is_empty() {
        return 0.0;
    }

    let mut runs = Vec::new();
    let mut run_len = 1usize;
    for pair in ordered.windows(2) {
        let gap = (pair[1].start - pair[0].end).max(0.0);
        if gap >= pause_threshold {
            runs.push(run_len);
            run_len = 1;
        } else {
            run_len += 1;
        }
    }
    runs.push(run_len);

    runs.iter().sum::<usize>() as f64 / runs.len() as f64
}

/// Spread of local speaking rate across fixed windows.
///
/// The word timeline from the first start to the last end is cut into
/// `window` second bins; each bin's rate counts the words overlapping it.
/// Returns the sample standard deviation of those rates, or `0.0` when the
/// timeline is shorter than one window.
pub fn rate_stability(words: &[Word], window: f64) -> f64 {
    let ordered = sorted_by_start(words);
    let Some(first) = ordered.first() else {
        return 0.0;
    };
    let t0 = first.start;
    let t1 = ordered.iter().map(|w| w.end).fold(f64::NEG_INFINITY, f64::max);
    let span = t1 - t0;
    if window <= 0.0 || span < window {
        return 0.0;
    }

    // Tolerance keeps an exact multiple of the window from growing an empty bin.
    let bins = ((span / window) - 1e-9).ceil().max(1.0) as usize;
    let rates: Vec<f64> = (0..bins)
        .map(|bin| {
            let lo = t0 + bin as f64 * window;
            let hi = lo + window;
            let count = ordered
                .iter()
                .filter(|w| w.start < hi && w.end > lo)
                .count();
            count as f64 / (window / 60.0)
        })
        .collect();

    sample_std_dev(&rates).unwrap_or(0.0)
}

fn sorted_by_start(words: &[Word]) -> Vec<&Word> {
    let mut ordered: Vec<&Word> = words.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));
    ordered
}
