use anyhow::{ensure, Result};

/// Linear-interpolation resampler from `source_rate` to `target_rate`.
///
/// Output length is `ceil(len * target / source)`, so the resampled clip
/// never ends before the source clip; any overshoot is under one output
/// sample. Source positions are computed from integer sample indices,
/// which keeps long clips free of accumulated drift.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let (source, target) = (source_rate as u64, target_rate as u64);
    let output_len = (samples.len() as u64 * target).div_ceil(source) as usize;
    let last = samples.len() - 1;
    Ok((0..output_len as u64)
        .map(|i| {
            let scaled = i * source;
            let left = ((scaled / target) as usize).min(last);
            let right = (left + 1).min(last);
            let frac = (scaled % target) as f32 / target as f32;
            samples[left] + (samples[right] - samples[left]) * frac
        })
        .collect())
}
