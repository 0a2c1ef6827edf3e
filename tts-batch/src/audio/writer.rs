//! Streaming WAV writer that rolls over to a new file before a size budget is exceeded.

use super::{BITS_PER_SAMPLE, CHANNELS, HEADER_SIZE, pcm_bytes, to_pcm16};
use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

type FileWavWriter = WavWriter<BufWriter<File>>;

/// Outcome of writing one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWrite {
    /// Index of the file the chunk went into (0 = the unsuffixed file)
    pub file_index: usize,
    /// Running size of that file, header included
    pub bytes_in_file: u64,
    /// PCM bytes written for this chunk
    pub chunk_bytes: u64,
    /// Whether this write closed the previous file and opened a new one
    pub rolled_over: bool,
}

/// Writes mono 16-bit PCM into `<stem>.wav`, `<stem>.part1.wav`, ... keeping each
/// file within `size_limit` bytes.
///
/// Exactly one file is open at a time. It is finalized on rollover, on
/// [`close`](Self::close), or when the writer is dropped on an error path.
pub struct ChunkedWavWriter {
    base_path: PathBuf,
    spec: WavSpec,
    size_limit: u64,
    current: Option<FileWavWriter>,
    file_index: usize,
    bytes_in_file: u64,
    files: Vec<PathBuf>,
}

impl ChunkedWavWriter {
    /// Open the first output file at `base_path`.
    pub fn create(base_path: &Path, sample_rate: u32, size_limit: u64) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut writer = Self {
            base_path: base_path.to_path_buf(),
            spec,
            size_limit,
            current: None,
            file_index: 0,
            bytes_in_file: HEADER_SIZE,
            files: Vec::new(),
        };
        writer.open_current()?;
        Ok(writer)
    }

    /// Path of the `index`-th file in the rollover sequence for `base_path`.
    pub fn file_path(base_path: &Path, index: usize) -> PathBuf {
        if index == 0 {
            return base_path.to_path_buf();
        }
        let stem = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        base_path.with_file_name(format!("{}.part{}.wav", stem, index))
    }

    /// Append one synthesized chunk, rolling over first if it would not fit.
    pub fn write_chunk(&mut self, samples: &[f32]) -> Result<ChunkWrite> {
        let chunk_bytes = pcm_bytes(samples.len());
        let projected = self.bytes_in_file + chunk_bytes;
        let has_audio = self.bytes_in_file > HEADER_SIZE;

        // A chunk larger than the whole budget still goes into an empty file
        let rolled_over = projected > self.size_limit && has_audio && chunk_bytes > 0;
        if rolled_over {
            self.finalize_current()?;
            self.file_index += 1;
            self.bytes_in_file = HEADER_SIZE;
            self.open_current()?;
        }

        let path = self.current_path();
        let writer = self
            .current
            .as_mut()
            .with_context(|| format!("No open WAV file for {}", path.display()))?;
        for &sample in samples {
            writer
                .write_sample(to_pcm16(sample))
                .with_context(|| format!("Failed to write audio to {}", path.display()))?;
        }
        self.bytes_in_file += chunk_bytes;

        Ok(ChunkWrite {
            file_index: self.file_index,
            bytes_in_file: self.bytes_in_file,
            chunk_bytes,
            rolled_over,
        })
    }

    /// Path of the file currently being written.
    pub fn current_path(&self) -> PathBuf {
        Self::file_path(&self.base_path, self.file_index)
    }

    /// Files opened so far, in order, the current one included.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[cfg(test)]
    pub fn bytes_in_file(&self) -> u64 {
        self.bytes_in_file
    }

    /// Finalize the open file and return every file written, in order.
    pub fn close(mut self) -> Result<Vec<PathBuf>> {
        self.finalize_current()?;
        Ok(std::mem::take(&mut self.files))
    }

    fn open_current(&mut self) -> Result<()> {
        let path = self.current_path();
        let writer = WavWriter::create(&path, self.spec)
            .with_context(|| format!("Failed to create WAV file {}", path.display()))?;
        self.current = Some(writer);
        self.files.push(path);
        Ok(())
    }

    fn finalize_current(&mut self) -> Result<()> {
        if let Some(writer) = self.current.take() {
            let path = self.current_path();
            writer
                .finalize()
                .with_context(|| format!("Failed to finalize WAV file {}", path.display()))?;
        }
        Ok(())
    }
}

impl Drop for ChunkedWavWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finalize_current() {
            log::error!("{:#}", e);
        }
    }
}
