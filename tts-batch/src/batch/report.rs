//! Batch run report, written next to the audio for manual follow-up.

use crate::character::VoiceProfile;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "batch_report.json";

/// A segment whose audio is missing from the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSegment {
    /// Position of the segment within its file
    pub index: usize,
    pub text: String,
    pub reason: String,
}

/// Result of processing one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub character: String,
    pub voice: String,
    /// Pitch shift for the voice-conversion step
    pub pitch: i32,
    /// Output files in rollover order
    pub outputs: Vec<PathBuf>,
    pub segments: usize,
    pub total_chars: usize,
    pub audio_bytes: u64,
    pub skipped_segments: Vec<SkippedSegment>,
}

impl FileReport {
    /// Empty report for `input` synthesized with `profile`.
    pub fn new(input: &Path, profile: &VoiceProfile) -> Self {
        Self {
            input: input.to_path_buf(),
            character: profile.character.clone(),
            voice: profile.voice.clone(),
            pitch: profile.pitch,
            outputs: Vec::new(),
            segments: 0,
            total_chars: 0,
            audio_bytes: 0,
            skipped_segments: Vec::new(),
        }
    }
}

/// An input file that was not processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub input: PathBuf,
    pub reason: String,
}

/// An input file whose processing stopped with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub input: PathBuf,
    pub error: String,
    /// Audio finalized before the failure
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub files: Vec<FileReport>,
    pub skipped_files: Vec<SkippedFile>,
    pub failed_files: Vec<FailedFile>,
}

impl BatchReport {
    pub fn new(input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            started_at: Utc::now(),
            finished_at: None,
            files: Vec::new(),
            skipped_files: Vec::new(),
            failed_files: Vec::new(),
        }
    }

    pub fn skip_file(&mut self, input: &Path, reason: impl Into<String>) {
        self.skipped_files.push(SkippedFile {
            input: input.to_path_buf(),
            reason: reason.into(),
        });
    }

    pub fn fail_file(&mut self, input: &Path, error: impl Into<String>, outputs: Vec<PathBuf>) {
        self.failed_files.push(FailedFile {
            input: input.to_path_buf(),
            error: error.into(),
            outputs,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of segments skipped across all files.
    pub fn skipped_segment_count(&self) -> usize {
        self.files.iter().map(|f| f.skipped_segments.len()).sum()
    }

    /// Fail when any input file could not be processed.
    pub fn check(&self) -> Result<()> {
        if self.failed_files.is_empty() {
            return Ok(());
        }
        let inputs: Vec<String> = self
            .failed_files
            .iter()
            .map(|f| f.input.display().to_string())
            .collect();
        anyhow::bail!(
            "{} file(s) failed: {}",
            self.failed_files.len(),
            inputs.join(", ")
        )
    }

    /// Write the report into the output directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.output_dir.join(REPORT_FILE_NAME);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).context("Failed to write report JSON")?;
        Ok(path)
    }

    #[cfg(test)]
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open report {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).context("Failed to parse report JSON")
    }
}
