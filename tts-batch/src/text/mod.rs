//! Text processing for TTS: normalization, number spelling and segmentation.

mod normalizer;
mod numbers;
pub mod segmenter;

pub use normalizer::normalize;
pub use segmenter::{LineSegmenter, Segmentation};

use crate::error::ConfigError;

/// Marks the end of a segment for the model.
pub const TERMINATOR: char = '\n';

/// A bounded slice of normalized text, the unit of work submitted to synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text including the trailing terminator
    text: String,
    /// Length in characters, terminator included
    chars: usize,
}

impl Segment {
    /// Create a segment from `body`, appending the terminator.
    pub fn terminated(body: &str) -> Self {
        let mut text = String::with_capacity(body.len() + 1);
        text.push_str(body);
        text.push(TERMINATOR);
        let chars = text.chars().count();
        Self { text, chars }
    }

    /// Full text as sent to the model.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text without the terminator.
    pub fn body(&self) -> &str {
        self.text.strip_suffix(TERMINATOR).unwrap_or(&self.text)
    }

    pub fn char_len(&self) -> usize {
        self.chars
    }
}

/// Prepare raw file lines for synthesis: trim, skip blanks, normalize, segment.
pub fn preprocess<S: AsRef<str>>(lines: &[S], limit: usize) -> Result<Segmentation, ConfigError> {
    let segmenter = LineSegmenter::new(limit)?;
    let normalized: Vec<String> = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .map(normalize)
        .collect();
    Ok(segmenter.segment(&normalized))
}
