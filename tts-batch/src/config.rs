//! tts-batch configuration: persistent user settings and the frozen per-run config.

use crate::audio::{
    DEFAULT_FILE_SIZE_LIMIT, DEFAULT_SAMPLE_RATE, HEADER_SIZE, MAX_FILE_SIZE_LIMIT,
    SUPPORTED_SAMPLE_RATES,
};
use crate::error::ConfigError;
use crate::tts::SynthesisOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// Defaults for the Silero v4 Russian model
const DEFAULT_DEVICE: &str = "cuda";
const DEFAULT_THREADS: usize = 6;
const DEFAULT_MODEL_ID: &str = "v4_ru";
const DEFAULT_LANGUAGE: &str = "ru";

/// Longest stable segment per voice, found with `tts-batch probe`.
const DEFAULT_LINE_LENGTH_LIMITS: &[(&str, usize)] = &[
    ("aidar", 870),
    ("baya", 860),
    ("eugene", 1000),
    ("kseniya", 870),
    ("xenia", 957),
    ("random", 355),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsBatchConfig {
    /// Device to use (cpu, cuda, auto)
    #[serde(default = "default_device")]
    pub device: String,

    /// Torch thread count, only effective on cpu
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Silero model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Output sample rate (48000, 24000 or 8000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_true")]
    pub put_accent: bool,

    #[serde(default = "default_true")]
    pub put_yo: bool,

    /// Byte budget per output WAV file
    #[serde(default = "default_file_size_limit")]
    pub file_size_limit: u64,

    /// Maximum segment length per voice
    #[serde(default = "default_line_length_limits")]
    pub line_length_limits: BTreeMap<String, usize>,
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_true() -> bool {
    true
}

fn default_file_size_limit() -> u64 {
    DEFAULT_FILE_SIZE_LIMIT
}

fn default_line_length_limits() -> BTreeMap<String, usize> {
    DEFAULT_LINE_LENGTH_LIMITS
        .iter()
        .map(|(voice, limit)| (voice.to_string(), *limit))
        .collect()
}

impl Default for TtsBatchConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            threads: default_threads(),
            model_id: default_model_id(),
            language: default_language(),
            sample_rate: default_sample_rate(),
            put_accent: true,
            put_yo: true,
            file_size_limit: default_file_size_limit(),
            line_length_limits: default_line_length_limits(),
        }
    }
}

impl TtsBatchConfig {
    /// Get the config file path: <config dir>/cli-programs/tts-batch.toml
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("cli-programs").join("tts-batch.toml"))
    }

    /// Load config from the default location, returning defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Validated, immutable configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub synthesis: SynthesisOptions,
    pub file_size_limit: u64,
    line_length_limits: BTreeMap<String, usize>,
    /// Draw progress bars
    pub show_progress: bool,
}

impl BatchConfig {
    /// Validate `settings` and freeze them for a run.
    pub fn from_settings(settings: &TtsBatchConfig) -> Result<Self, ConfigError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&settings.sample_rate) {
            return Err(ConfigError::UnsupportedSampleRate(settings.sample_rate));
        }
        if settings.file_size_limit <= HEADER_SIZE {
            return Err(ConfigError::FileSizeLimitTooSmall {
                limit: settings.file_size_limit,
                header: HEADER_SIZE,
            });
        }
        if settings.file_size_limit > MAX_FILE_SIZE_LIMIT {
            return Err(ConfigError::FileSizeLimitTooLarge(settings.file_size_limit));
        }
        if let Some(&limit) = settings.line_length_limits.values().find(|&&l| l <= 3) {
            return Err(ConfigError::LimitTooSmall(limit));
        }

        Ok(Self {
            synthesis: SynthesisOptions::new()
                .with_sample_rate(settings.sample_rate)
                .with_accent(settings.put_accent)
                .with_yo(settings.put_yo),
            file_size_limit: settings.file_size_limit,
            line_length_limits: settings.line_length_limits.clone(),
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Maximum segment length for `voice`.
    pub fn limit_for(&self, voice: &str) -> Result<usize, ConfigError> {
        self.line_length_limits
            .get(voice)
            .copied()
            .ok_or_else(|| ConfigError::UnknownVoice(voice.to_string()))
    }

    /// Configured voices, in name order.
    pub fn voices(&self) -> impl Iterator<Item = &str> {
        self.line_length_limits.keys().map(String::as_str)
    }
}
