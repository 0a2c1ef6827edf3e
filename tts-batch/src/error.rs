//! Error types for configuration, character lookup and synthesis.

use thiserror::Error;

/// Structural misconfiguration. Fatal: the run stops before any file is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line length limit must be greater than 3, got {0}")]
    LimitTooSmall(usize),

    #[error("unsupported sample rate {0} Hz (expected 48000, 24000 or 8000)")]
    UnsupportedSampleRate(u32),

    #[error("file size limit of {limit} bytes must be larger than the {header} byte WAV header")]
    FileSizeLimitTooSmall { limit: u64, header: u64 },

    #[error("file size limit of {0} bytes exceeds the 4 GiB WAV ceiling")]
    FileSizeLimitTooLarge(u64),

    #[error("no line length limit configured for voice '{0}'")]
    UnknownVoice(String),
}

/// Problems resolving the character behind an input file. The file is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharacterError {
    #[error("could not extract character name from file name: {0}")]
    UnparsableFileName(String),

    #[error("character '{0}' not found in character configuration")]
    MissingCharacter(String),
}

/// Failure of a single synthesis call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The model rejected the text itself (unsupported characters, empty after cleanup).
    #[error("text rejected by model: {0}")]
    InvalidText(String),

    /// The segment is longer than the model can handle for this voice.
    #[error("segment of {chars} characters is too long for the model: {message}")]
    TooLong { chars: usize, message: String },

    /// Anything else: the model or its runtime is broken.
    #[error("synthesis backend failure: {0}")]
    Backend(String),
}

impl SynthesisError {
    /// Per-segment failures skip the segment; backend failures stop the batch.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SynthesisError::Backend(_))
    }
}
