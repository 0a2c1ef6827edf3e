//! Character configuration and voice selection for input files.
//!
//! Input files are named `<index>_<Name>.txt`; the name selects a character
//! record `{ "speaker": <voice>, "pitch": <semitones> }` from a JSON map.

use crate::config::BatchConfig;
use crate::error::{CharacterError, ConfigError};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\p{L}+)\.txt$").expect("valid name regex"));

static INDEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)_").expect("valid index regex"));

/// A character record from the character configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Synthesis voice identifier
    pub speaker: String,
    /// Pitch shift for voice conversion (male to female = 12, female to male = -12)
    #[serde(default)]
    pub pitch: i32,
}

/// Character name -> record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterMap(BTreeMap<String, Character>);

impl CharacterMap {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.0.get(name)
    }

    #[cfg(test)]
    pub fn insert(&mut self, name: impl Into<String>, character: Character) {
        self.0.insert(name.into(), character);
    }
}

/// Voice and limits used to synthesize one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub character: String,
    pub voice: String,
    pub pitch: i32,
    /// Maximum segment length for this voice
    pub limit: usize,
}

/// How input files are mapped to voices.
#[derive(Debug, Clone)]
pub enum VoiceSelection {
    /// Look the character up by file name
    ByCharacter(CharacterMap),
    /// Use one voice for every file
    Fixed { voice: String, pitch: i32 },
}

impl VoiceSelection {
    /// Check that every voice this selection can produce has a length limit.
    pub fn validate(&self, config: &BatchConfig) -> Result<(), ConfigError> {
        match self {
            VoiceSelection::ByCharacter(characters) => {
                for character in characters.0.values() {
                    config.limit_for(&character.speaker)?;
                }
                Ok(())
            }
            VoiceSelection::Fixed { voice, .. } => config.limit_for(voice).map(|_| ()),
        }
    }

    /// Resolve the voice for an input file name. Call [`validate`](Self::validate) first.
    pub fn resolve(
        &self,
        file_name: &str,
        config: &BatchConfig,
    ) -> std::result::Result<VoiceProfile, ResolveError> {
        match self {
            VoiceSelection::ByCharacter(characters) => {
                let name = character_name(file_name)?;
                let character = characters
                    .get(&name)
                    .ok_or_else(|| CharacterError::MissingCharacter(name.clone()))?;
                Ok(VoiceProfile {
                    limit: config.limit_for(&character.speaker)?,
                    voice: character.speaker.clone(),
                    pitch: character.pitch,
                    character: name,
                })
            }
            VoiceSelection::Fixed { voice, pitch } => Ok(VoiceProfile {
                character: character_name(file_name).unwrap_or_default(),
                voice: voice.clone(),
                pitch: *pitch,
                limit: config.limit_for(voice)?,
            }),
        }
    }
}

/// Why a file could not be given a voice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Character(#[from] CharacterError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Extract the character name from `<index>_<Name>.txt`.
pub fn character_name(file_name: &str) -> std::result::Result<String, CharacterError> {
    NAME_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CharacterError::UnparsableFileName(file_name.to_string()))
}

/// Ordinal index of the speaker turn, if the file name starts with one.
pub fn turn_index(file_name: &str) -> Option<u64> {
    INDEX_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
