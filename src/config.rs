// Generator configuration
// Defaults, JSON config file loading and validation

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::composer::external::ExternalCommand;
use crate::composer::melody::MelodyBackend;
use crate::composer::merge::MergeMode;
use crate::composer::midi::{ticks_for_steps, MidiExportOptions, MAX_MIDI_TICKS};
use crate::composer::sequence::STEPS_PER_QUARTER;
use crate::state::sanitize_file_stem;

/// Config file name inside the user config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How output files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FileNaming {
    /// `{genre}_{n}.mid`, n starting at 1
    #[default]
    GenreIndexed,

    /// `{n}.mid`, n starting at 0
    Plain,
}

impl FileNaming {
    /// File name for the composition at zero-based `index`
    pub fn file_name(&self, genre: &str, index: u32) -> String {
        match self {
            FileNaming::GenreIndexed => format!("{}_{}.mid", sanitize_file_stem(genre), index + 1),
            FileNaming::Plain => format!("{}.mid", index),
        }
    }
}

/// Settings for a generation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Model identifier forwarded to external generators
    pub model_name: String,

    /// Directory compositions are written to
    pub output_dir: PathBuf,

    /// Sampling temperature for melody generation
    pub temperature: f64,

    /// Compositions per batch
    pub num_compositions: u32,

    /// Steps (sixteenth notes) per composition
    pub steps_per_composition: u32,

    /// Seed for every random choice; `None` seeds from entropy
    pub seed: Option<u64>,

    pub naming: FileNaming,
    pub backend: MelodyBackend,

    /// Required when `backend` is `external`
    pub external_command: Option<ExternalCommand>,

    pub merge_mode: MergeMode,
    pub midi: MidiExportOptions,

    /// Write `manifest.json` after a successful batch
    pub write_manifest: bool,

    /// Append progress to `trace.jsonl` while generating
    pub write_trace: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            model_name: "attention_rnn".to_string(),
            output_dir: PathBuf::from("generated_music"),
            temperature: 1.2,
            num_compositions: 3,
            steps_per_composition: 256,
            seed: None,
            naming: FileNaming::GenreIndexed,
            backend: MelodyBackend::ChordTones,
            external_command: None,
            merge_mode: MergeMode::Overlay,
            midi: MidiExportOptions::default(),
            write_manifest: true,
            write_trace: true,
        }
    }
}

impl GeneratorConfig {
    /// Check value ranges and backend requirements
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_composition == 0 {
            return Err(ConfigError::Invalid("steps_per_composition must be at least 1".to_string()));
        }
        if self.num_compositions == 0 {
            return Err(ConfigError::Invalid("num_compositions must be at least 1".to_string()));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if self.midi.ppq == 0 {
            return Err(ConfigError::Invalid("midi.ppq must be positive".to_string()));
        }
        if ticks_for_steps(self.steps_per_composition, self.midi.ppq, STEPS_PER_QUARTER) > MAX_MIDI_TICKS {
            return Err(ConfigError::Invalid(format!(
                "steps_per_composition {} is too long for MIDI at {} ppq",
                self.steps_per_composition, self.midi.ppq
            )));
        }
        if self.backend == MelodyBackend::External && self.external_command.is_none() {
            return Err(ConfigError::Invalid(
                "backend 'external' needs external_command".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a config from JSON text; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Default config file location (`<config dir>/cadenza/config.json`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cadenza").join(CONFIG_FILE_NAME))
}

/// Load configuration
///
/// An explicit path must exist. Without one, the default location is used if
/// present, otherwise built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => path,
            None => {
                log::debug!("No config file found, using defaults");
                return Ok(GeneratorConfig::default());
            }
        },
    };

    let json = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    log::info!("Loaded config from {}", path.display());
    GeneratorConfig::from_json(&json)
}
