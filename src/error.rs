use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for results returned by pipeline stages.
pub type Result<T> = std::result::Result<T, FluencyError>;

/// Pipeline stage that can fail without aborting an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    VoiceActivity,
    Transcription,
    Prosody,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::VoiceActivity => "voice activity detection",
            Stage::Transcription => "transcription",
            Stage::Prosody => "prosody analysis",
        }
    }
}

#[derive(Debug, Error)]
pub enum FluencyError {
    /// Missing, empty or undecodable audio. Ends the evaluation with a zero score.
    #[error("invalid audio input {path:?}: {message}")]
    Input { path: PathBuf, message: String },
    /// A sub-model failed. The orchestrator substitutes defaults and continues.
    #[error("{} failed: {message}", stage.as_str())]
    Substage { stage: Stage, message: String },
}

impl FluencyError {
    pub(crate) fn input(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Input {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn substage(stage: Stage, err: impl std::fmt::Display) -> Self {
        Self::Substage {
            stage,
            message: err.to_string(),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substage_message_names_the_stage() {
        let err = FluencyError::substage(Stage::VoiceActivity, "model not found");
        assert_eq!(
            err.to_string(),
            "voice activity detection failed: model not found"
        );
        assert!(!err.is_input());
    }
}
