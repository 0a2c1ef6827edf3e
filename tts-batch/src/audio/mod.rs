//! PCM WAV output: format constants and the size-bounded chunked writer.

pub mod writer;

pub use writer::ChunkedWavWriter;

use std::time::Duration;

/// Mono output.
pub const CHANNELS: u16 = 1;

/// 16-bit signed samples.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per sample.
pub const SAMPLE_WIDTH: u64 = (BITS_PER_SAMPLE / 8) as u64;

/// Size of a canonical PCM WAV header.
pub const HEADER_SIZE: u64 = 44;

/// Sample rates the Silero models produce.
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [48_000, 24_000, 8_000];

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default byte budget per output file: about 1h 33m of audio at 48 kHz.
pub const DEFAULT_FILE_SIZE_LIMIT: u64 = 512 * 1024 * 1024;

/// RIFF sizes are 32-bit.
pub const MAX_FILE_SIZE_LIMIT: u64 = u32::MAX as u64;

/// Bytes occupied by `samples` samples of PCM data.
pub fn pcm_bytes(samples: usize) -> u64 {
    samples as u64 * SAMPLE_WIDTH * CHANNELS as u64
}

/// Playback duration of `bytes` bytes of PCM data.
pub fn audio_duration(bytes: u64, sample_rate: u32) -> Duration {
    let bytes_per_second = CHANNELS as u64 * SAMPLE_WIDTH * sample_rate as u64;
    if bytes_per_second == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(bytes as f64 / bytes_per_second as f64)
}

/// Scale a floating-point sample in [-1.0, 1.0] to 16-bit PCM, saturating out-of-range input.
pub fn to_pcm16(sample: f32) -> i16 {
    (sample * i16::MAX as f32) as i16
}
