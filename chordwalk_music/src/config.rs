// Generation configuration.
//
// Describes which pieces to write: for each, an output path, a bar count, a
// transition table (built-in preset or JSON file) and an optional seed. The
// composer settings are shared by every piece. Loaded from JSON:
//
//   {
//     "pieces": [
//       { "output": "walk.mid", "bars": 16, "table": { "preset": "uniform" }, "seed": 7 },
//       { "output": "custom.mid", "bars": 8, "table": { "file": "my_table.json" } }
//     ],
//     "composer": { "bar_ticks": 512, "note_durations": [64, 128, 256] }
//   }
//
// Every field of `composer` is optional. Without a config file the binary
// uses `GenerationConfig::default()`: eight bars per preset, written to
// transitiontable1.mid .. transitiontable3.mid.

use crate::compose::ComposerSettings;
use crate::error::ConfigError;
use crate::markov::{Preset, TransitionTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "chordwalk.json";

const DEFAULT_BARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    Preset(Preset),
    File(PathBuf),
}

impl TableSource {
    /// Resolve to a validated table. Relative file paths are taken from
    /// `base_dir`.
    pub fn resolve(&self, base_dir: &Path) -> Result<TransitionTable, ConfigError> {
        match self {
            TableSource::Preset(preset) => Ok(TransitionTable::preset(*preset)),
            TableSource::File(path) => Ok(TransitionTable::load(&base_dir.join(path))?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceConfig {
    pub output: PathBuf,
    #[serde(default = "default_bars")]
    pub bars: usize,
    pub table: TableSource,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_bars() -> usize {
    DEFAULT_BARS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub pieces: Vec<PieceConfig>,
    #[serde(default)]
    pub composer: ComposerSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let pieces = Preset::ALL
            .into_iter()
            .enumerate()
            .map(|(i, preset)| PieceConfig {
                output: PathBuf::from(format!("transitiontable{}.mid", i + 1)),
                bars: DEFAULT_BARS,
                table: TableSource::Preset(preset),
                seed: None,
            })
            .collect();
        GenerationConfig {
            pieces,
            composer: ComposerSettings::default(),
        }
    }
}

impl GenerationConfig {
    /// Parse and validate from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), pieces = config.pieces.len(), "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pieces.is_empty() {
            return Err(ConfigError::Invalid("no pieces configured".to_string()));
        }
        for piece in &self.pieces {
            if piece.output.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("piece with empty output path".to_string()));
            }
        }
        self.composer.validate()
    }
}
