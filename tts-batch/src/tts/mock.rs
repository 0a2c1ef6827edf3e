//! Mock synthesizer for testing the driver and the limit probe.

use super::{SynthesisOptions, Synthesizer};
use crate::error::SynthesisError;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a fixed number of samples per call, with scripted failures.
pub struct MockSynthesizer {
    samples_per_call: usize,
    /// Call numbers (0-based) that fail with `InvalidText`
    invalid_calls: HashSet<usize>,
    /// Call number that fails with `Backend`
    backend_failure_at: Option<usize>,
    /// Texts longer than this (terminator excluded) fail with `TooLong`
    max_chars: Option<usize>,
    call_count: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    /// Create a synthesizer that always succeeds.
    pub fn always_succeeds(samples_per_call: usize) -> Self {
        Self {
            samples_per_call,
            invalid_calls: HashSet::new(),
            backend_failure_at: None,
            max_chars: None,
            call_count: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Reject the given call numbers as invalid text.
    pub fn rejecting_calls(mut self, calls: &[usize]) -> Self {
        self.invalid_calls = calls.iter().copied().collect();
        self
    }

    /// Fail with a backend error on the given call.
    pub fn backend_failure_at(mut self, call: usize) -> Self {
        self.backend_failure_at = Some(call);
        self
    }

    /// Report `TooLong` for texts over `max_chars` characters.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl Synthesizer for MockSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        _options: &SynthesisOptions,
    ) -> Result<Vec<f32>, SynthesisError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());

        if self.backend_failure_at == Some(call) {
            return Err(SynthesisError::Backend("CUDA out of memory".to_string()));
        }
        if self.invalid_calls.contains(&call) {
            return Err(SynthesisError::InvalidText(format!("call {}", call)));
        }
        let chars = text.trim_end_matches('\n').chars().count();
        if let Some(max) = self.max_chars {
            if chars > max {
                return Err(SynthesisError::TooLong {
                    chars,
                    message: format!("more than {} characters", max),
                });
            }
        }

        Ok(vec![0.1; self.samples_per_call])
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_failures() {
        let mock = MockSynthesizer::always_succeeds(10)
            .rejecting_calls(&[1])
            .backend_failure_at(2);
        let opts = SynthesisOptions::default();

        assert_eq!(mock.synthesize("a", "v", &opts).unwrap().len(), 10);
        assert!(matches!(
            mock.synthesize("b", "v", &opts),
            Err(SynthesisError::InvalidText(_))
        ));
        assert!(matches!(
            mock.synthesize("c", "v", &opts),
            Err(SynthesisError::Backend(_))
        ));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_too_long() {
        let mock = MockSynthesizer::always_succeeds(1).with_max_chars(3);
        let opts = SynthesisOptions::default();
        assert!(mock.synthesize("abc\n", "v", &opts).is_ok());
        assert!(matches!(
            mock.synthesize("abcd\n", "v", &opts),
            Err(SynthesisError::TooLong { chars: 4, .. })
        ));
    }
}
