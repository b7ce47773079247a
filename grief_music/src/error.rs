// Error taxonomy for the synthesis engine and its file boundaries.
//
// Every failure is structural: bad numeric input is caught before the first
// sample is computed, and unknown stage names are caught before a buffer is
// allocated. Nothing here is retryable, and no caller ever receives a
// partially built buffer or event list alongside an error.
//
// A chord whose summed waveform is all zeros is *not* an error: `chord.rs`
// skips normalization for it and logs at debug level.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SynthError>;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A duration, sample rate, amplitude, or frequency outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A stage name that is neither in the parameter table nor a pseudo-stage.
    #[error(
        "unknown stage '{0}' (valid stages: Denial, Anger, Bargaining, Depression, Acceptance, Flatline)"
    )]
    UnknownStage(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("MIDI encoding failed: {0}")]
    Midi(String),

    #[error("config parse failed: {0}")]
    Config(#[from] serde_json::Error),
}

impl SynthError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SynthError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(
            name,
            format!("must be a finite value > 0, got {value}"),
        ))
    }
}
