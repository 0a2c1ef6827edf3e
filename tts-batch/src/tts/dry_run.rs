//! Backend that produces silence instead of speech.
//!
//! Output length follows a typical speaking rate, so file sizes, rollover
//! and progress estimates can be checked without loading a model.

use super::{SynthesisOptions, Synthesizer};
use crate::error::SynthesisError;

/// Approximate speaking rate of the Silero Russian voices.
const CHARS_PER_SECOND: f64 = 14.0;

#[derive(Debug, Default)]
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for DryRunBackend {
    fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        options: &SynthesisOptions,
    ) -> Result<Vec<f32>, SynthesisError> {
        let chars = text.trim().chars().count();
        if chars == 0 {
            return Err(SynthesisError::InvalidText("empty text".to_string()));
        }
        let seconds = chars as f64 / CHARS_PER_SECOND;
        let samples = (seconds * options.sample_rate as f64).round() as usize;
        Ok(vec![0.0; samples])
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
