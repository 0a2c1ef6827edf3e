//! Speech synthesis backend trait and types.

pub mod dry_run;
#[cfg(test)]
pub mod mock;
#[cfg(feature = "silero")]
pub mod silero;

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::config::TtsBatchConfig;
use crate::error::SynthesisError;
use anyhow::Result;

/// Per-run options passed with every synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Output sample rate in Hz (48000, 24000 or 8000)
    pub sample_rate: u32,
    /// Let the model place stress marks
    pub put_accent: bool,
    /// Let the model restore "ё"
    pub put_yo: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            put_accent: true,
            put_yo: true,
        }
    }
}

impl SynthesisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_accent(mut self, put_accent: bool) -> Self {
        self.put_accent = put_accent;
        self
    }

    pub fn with_yo(mut self, put_yo: bool) -> Self {
        self.put_yo = put_yo;
        self
    }
}

/// A speech model: text + voice + options -> mono samples in [-1.0, 1.0].
pub trait Synthesizer {
    /// Synthesize one segment.
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        options: &SynthesisOptions,
    ) -> std::result::Result<Vec<f32>, SynthesisError>;

    /// Backend name for display.
    fn name(&self) -> &str;
}

/// Available synthesis backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Silero neural TTS (requires the `silero` feature)
    Silero,
    /// Silence sized by text length, for size and time previews
    DryRun,
}

/// Create a synthesis backend.
pub fn create_backend(
    kind: BackendKind,
    settings: &TtsBatchConfig,
) -> Result<Box<dyn Synthesizer>> {
    match kind {
        BackendKind::DryRun => Ok(Box::new(dry_run::DryRunBackend::new())),
        BackendKind::Silero => create_silero(settings),
    }
}

#[cfg(feature = "silero")]
fn create_silero(settings: &TtsBatchConfig) -> Result<Box<dyn Synthesizer>> {
    Ok(Box::new(silero::SileroBackend::load(settings)?))
}

#[cfg(not(feature = "silero"))]
fn create_silero(_settings: &TtsBatchConfig) -> Result<Box<dyn Synthesizer>> {
    anyhow::bail!(
        "tts-batch was built without the `silero` feature. \
         Rebuild with `--features silero` or use `--backend dry-run`."
    )
}
