//! Search for the longest segment length a voice can synthesize.
//!
//! The model fails on segments that are too long for it, and the threshold
//! differs per voice. Starting from a candidate limit, the sample text is
//! re-segmented with one character less until every segment goes through.

use crate::config::BatchConfig;
use crate::error::SynthesisError;
use crate::text;
use crate::tts::{SynthesisOptions, Synthesizer};
use serde::Serialize;

/// Smallest limit the segmenter accepts.
pub const MIN_LIMIT: usize = 4;

/// Outcome of a limit search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LimitSearch {
    /// Every segment synthesized at this limit
    Found { limit: usize },
    /// No usable limit
    Exhausted { reason: String },
}

/// Find the largest limit, at most `start_limit`, at which `lines` synthesize with `voice`.
///
/// Only `TooLong` lowers the limit. Rejected segments are skipped and a
/// backend failure ends the search.
pub fn find_max_limit<S: AsRef<str>>(
    synthesizer: &dyn Synthesizer,
    lines: &[S],
    voice: &str,
    start_limit: usize,
    options: &SynthesisOptions,
) -> LimitSearch {
    let mut limit = start_limit;

    'search: loop {
        if limit < MIN_LIMIT {
            return LimitSearch::Exhausted {
                reason: format!("{} fails even at the minimum limit of {}", voice, MIN_LIMIT),
            };
        }

        let segmentation = match text::preprocess(lines, limit) {
            Ok(segmentation) => segmentation,
            Err(e) => return LimitSearch::Exhausted { reason: e.to_string() },
        };

        for segment in &segmentation.segments {
            match synthesizer.synthesize(segment.text(), voice, options) {
                Ok(_) => {}
                Err(SynthesisError::TooLong { chars, .. }) => {
                    log::info!(
                        "{}: {} char segment failed at limit {}, retrying with {}",
                        voice,
                        chars,
                        limit,
                        limit - 1
                    );
                    limit -= 1;
                    continue 'search;
                }
                Err(e @ SynthesisError::InvalidText(_)) => {
                    log::warn!("{}: skipping segment: {}", voice, e);
                }
                Err(e) => return LimitSearch::Exhausted { reason: e.to_string() },
            }
        }

        log::info!("Found limit: {} has line length limit {}", voice, limit);
        return LimitSearch::Found { limit };
    }
}

/// Run [`find_max_limit`] for every configured voice, starting from its configured limit.
pub fn find_max_limits<S: AsRef<str>>(
    synthesizer: &dyn Synthesizer,
    lines: &[S],
    config: &BatchConfig,
) -> Vec<(String, LimitSearch)> {
    config
        .voices()
        .map(|voice| {
            let start = config.limit_for(voice).unwrap_or(MIN_LIMIT);
            let result = find_max_limit(synthesizer, lines, voice, start, &config.synthesis);
            (voice.to_string(), result)
        })
        .collect()
}
