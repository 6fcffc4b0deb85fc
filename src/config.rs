use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keyboard::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("keyboard capacity must be at least 1")]
    ZeroKeyboardCapacity,
    #[error("mapping mode {0:#04X} uses bits above 0x0F")]
    InvalidMappingMode(u8),
}

/// Machine configuration as loaded from JSON. ROMs not given stay blank
/// (0xFF).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdamConfig {
    pub writer_rom: Option<PathBuf>,
    pub os7_rom: Option<PathBuf>,
    pub expansion_rom: Option<PathBuf>,
    pub cartridge: Option<PathBuf>,
    pub expansion_ram: bool,
    pub keyboard_capacity: usize,
    pub mapping_mode: u8,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            writer_rom: None,
            os7_rom: None,
            expansion_rom: None,
            cartridge: None,
            expansion_ram: false,
            keyboard_capacity: DEFAULT_QUEUE_CAPACITY,
            mapping_mode: 0x00,
        }
    }
}

impl AdamConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AdamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loading configuration from {:?}", path);
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keyboard_capacity == 0 {
            return Err(ConfigError::ZeroKeyboardCapacity);
        }
        if self.mapping_mode > 0x0F {
            return Err(ConfigError::InvalidMappingMode(self.mapping_mode));
        }
        Ok(())
    }
}
