pub mod decoder;
pub mod resample;

use std::path::Path;

use tracing::debug;

use crate::error::{FluencyError, Result};
use crate::types::{AudioStream, TARGET_SAMPLE_RATE};

/// Decode `path` into a mono 16 kHz stream.
///
/// Duration is measured at the file's native rate so it matches what the
/// container reports, independent of resampling round-off. Missing, corrupt
/// and zero-length files are all input errors.
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<AudioStream> {
    let path = path.as_ref();
    let decoded = decoder::decode_audio(path).map_err(|err| FluencyError::input(path, format!("{err:#}")))?;
    if decoded.samples.is_empty() {
        return Err(FluencyError::input(path, "Audio file is empty or invalid."));
    }

    let duration_seconds = decoded.samples.len() as f64 / decoded.sample_rate as f64;
    let samples = resample::linear_resample(&decoded.samples, decoded.sample_rate, TARGET_SAMPLE_RATE)
        .map_err(|err| FluencyError::input(path, err))?;
    debug!(
        path = %path.display(),
        native_rate = decoded.sample_rate,
        duration_seconds,
        "decoded audio"
    );

    Ok(AudioStream {
        samples,
        sample_rate: TARGET_SAMPLE_RATE,
        duration_seconds,
    })
}
