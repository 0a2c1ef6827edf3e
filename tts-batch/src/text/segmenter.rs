//! Splitting normalized lines into segments the model can synthesize.

use super::Segment;
use crate::error::ConfigError;

/// Sentence boundaries, scanned in this order. The latest one found wins.
const SENTENCE_BOUNDARIES: [char; 3] = ['.', '!', '?'];

/// Room kept for the retained boundary character and the terminator.
const RESERVED_CHARS: usize = 2;

/// Result of segmenting a file: ordered segments and their total character count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    pub total_chars: usize,
}

impl Segmentation {
    pub(crate) fn push(&mut self, segment: Segment) {
        self.total_chars += segment.char_len();
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Splits lines at sentence, then word, then hard boundaries.
#[derive(Debug, Clone, Copy)]
pub struct LineSegmenter {
    effective_limit: usize,
}

impl LineSegmenter {
    /// Create a segmenter for a per-voice `limit` (segment length including terminator).
    pub fn new(limit: usize) -> Result<Self, ConfigError> {
        if limit <= 3 {
            return Err(ConfigError::LimitTooSmall(limit));
        }
        Ok(Self {
            effective_limit: limit - RESERVED_CHARS,
        })
    }

    /// Segment every non-blank line, in order.
    pub fn segment<S: AsRef<str>>(&self, lines: &[S]) -> Segmentation {
        let mut out = Segmentation::default();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            self.split_line(line, &mut out);
        }
        out
    }

    /// Split one (already trimmed) line, appending its segments to `out`.
    fn split_line(&self, line: &str, out: &mut Segmentation) {
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;

        while start < chars.len() {
            let remaining = &chars[start..];
            if remaining.len() < self.effective_limit {
                emit(remaining, out);
                break;
            }

            let split = self.split_position(remaining);
            // The boundary character stays with the emitted segment
            let end = (split + 1).min(remaining.len());
            emit(&remaining[..end], out);
            start += end;
        }
    }

    fn split_position(&self, text: &[char]) -> usize {
        let mut position = SENTENCE_BOUNDARIES
            .iter()
            .map(|&c| last_before(text, c, self.effective_limit))
            .fold(0, usize::max);

        if position == 0 {
            position = last_before(text, ' ', self.effective_limit);
        }
        if position == 0 {
            position = self.effective_limit;
        }
        position
    }
}

/// Position of the last `needle` strictly before `limit`, or 0 if there is none.
fn last_before(text: &[char], needle: char, limit: usize) -> usize {
    let window = &text[..limit.min(text.len())];
    window.iter().rposition(|&c| c == needle).unwrap_or(0)
}

fn emit(chars: &[char], out: &mut Segmentation) {
    if chars.iter().all(|c| c.is_whitespace()) {
        return;
    }
    let body: String = chars.iter().collect();
    out.push(Segment::terminated(&body));
}
