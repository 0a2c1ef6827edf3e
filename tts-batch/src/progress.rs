//! Progress, ETA and output-size estimation for one input file.

use crate::audio;
use std::fmt;
use std::time::{Duration, Instant};

/// The first synthesis calls pay a one-time model warm-up. Time spent
/// before this segment is excluded from rate estimates.
pub const WARMUP_SEGMENTS: usize = 3;

const MIB: u64 = 1024 * 1024;

/// Cumulative counters for one input file.
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    total_chars: usize,
    sample_rate: u32,
    started: Instant,
    warmup: Duration,
    segments_seen: usize,
    processed_chars: usize,
    audio_bytes_total: u64,
    audio_bytes_current: u64,
    file_index: usize,
}

/// Derived view of progress after a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub segment_number: usize,
    pub processed_chars: usize,
    pub total_chars: usize,
    /// Percent complete, rounded to one decimal place
    pub percent: f64,
    /// Wall-clock time since start, warm-up excluded
    pub elapsed: Duration,
    /// Linear projection of the run time for the whole file
    pub estimated_total: Duration,
    pub remaining: Duration,
    pub audio_mib: u64,
    pub estimated_audio_mib: u64,
    pub audio_duration: Duration,
    pub estimated_audio_duration: Duration,
    /// Audio in the output file currently being written
    pub current_file_duration: Duration,
    pub file_index: usize,
}

impl ProgressEstimator {
    pub fn new(total_chars: usize, sample_rate: u32) -> Self {
        Self::starting_at(total_chars, sample_rate, Instant::now())
    }

    pub fn starting_at(total_chars: usize, sample_rate: u32, started: Instant) -> Self {
        Self {
            total_chars,
            sample_rate,
            started,
            warmup: Duration::ZERO,
            segments_seen: 0,
            processed_chars: 0,
            audio_bytes_total: 0,
            audio_bytes_current: 0,
            file_index: 0,
        }
    }

    /// Record a processed segment and the audio bytes it produced (0 if skipped).
    pub fn observe(&mut self, segment_chars: usize, audio_bytes: u64) -> ProgressSnapshot {
        self.observe_at(segment_chars, audio_bytes, Instant::now())
    }

    pub fn observe_at(
        &mut self,
        segment_chars: usize,
        audio_bytes: u64,
        now: Instant,
    ) -> ProgressSnapshot {
        self.segments_seen += 1;
        self.processed_chars += segment_chars;
        self.audio_bytes_total += audio_bytes;
        self.audio_bytes_current += audio_bytes;

        if self.segments_seen == WARMUP_SEGMENTS {
            self.warmup = now.saturating_duration_since(self.started);
        }

        self.snapshot_at(now)
    }

    /// The writer moved on to a new output file.
    pub fn start_next_file(&mut self) {
        self.audio_bytes_current = 0;
        self.file_index += 1;
    }

    pub fn warmup(&self) -> Duration {
        self.warmup
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now
            .saturating_duration_since(self.started)
            .saturating_sub(self.warmup);
        let estimated_total = self.extrapolate(elapsed);

        let audio_duration = audio::audio_duration(self.audio_bytes_total, self.sample_rate);
        let estimated_audio_duration = self.extrapolate(audio_duration);

        let estimated_audio_mib = if self.processed_chars == 0 {
            0
        } else {
            (self.audio_bytes_total as f64 / MIB as f64 * self.total_chars as f64
                / self.processed_chars as f64) as u64
        };

        ProgressSnapshot {
            segment_number: self.segments_seen,
            processed_chars: self.processed_chars,
            total_chars: self.total_chars,
            percent: self.percent(),
            elapsed,
            estimated_total,
            remaining: estimated_total.saturating_sub(elapsed),
            audio_mib: self.audio_bytes_total / MIB,
            estimated_audio_mib,
            audio_duration,
            estimated_audio_duration,
            current_file_duration: audio::audio_duration(
                self.audio_bytes_current,
                self.sample_rate,
            ),
            file_index: self.file_index,
        }
    }

    fn percent(&self) -> f64 {
        if self.total_chars == 0 {
            return 100.0;
        }
        let ratio = self.processed_chars as f64 * 100.0 / self.total_chars as f64;
        (ratio * 10.0).round() / 10.0
    }

    /// Scale an observed quantity by total / processed characters.
    fn extrapolate(&self, observed: Duration) -> Duration {
        if self.processed_chars == 0 {
            return Duration::ZERO;
        }
        observed.mul_f64(self.total_chars as f64 / self.processed_chars as f64)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}/{} chars {}/{} MiB {}/{} TTS {}@part{} {:.1}%",
            format_duration(self.elapsed),
            format_duration(self.estimated_total),
            self.processed_chars,
            self.total_chars,
            self.audio_mib,
            self.estimated_audio_mib,
            format_duration(self.audio_duration),
            format_duration(self.estimated_audio_duration),
            format_duration(self.current_file_duration),
            self.file_index,
            self.percent,
        )
    }
}

/// Format as `H:MM:SS`, truncating fractional seconds.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
