//! Frontend configuration stored as JSON.
//!
//! Fields missing from the file take their default, so an older config keeps
//! loading as options are added. Command-line flags override what is loaded here.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Save-state slot used by the quick save/load keys.
    pub state_slot: u8,
    /// Integer window scale over 256x240.
    pub window_scale: u32,
    /// Frames skipped between rendered frames. 0 renders every frame.
    pub frame_skip: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_slot: 0,
            window_scale: 3,
            frame_skip: 0,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Like `load`, but any failure falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Whether frame number `frame` (counting from 0) should be drawn.
    pub fn should_render(&self, frame: u64) -> bool {
        frame % (self.frame_skip as u64 + 1) == 0
    }
}
