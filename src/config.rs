// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{app_info, capture, timing};
use crate::errors::ConfigError;
use crate::pipeline::{CaptureSource, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Persisted settings, overridable from the command line
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device path (`test` selects the built-in test pattern)
    pub device: String,
    /// Open a preview window
    pub gui: bool,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Upper bound on waiting for one frame
    pub frame_timeout_ms: u64,
    /// Stop the demo after this many frames
    pub max_frames: Option<u64>,
    /// Override the display sink element
    pub display_sink: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: capture::DEFAULT_DEVICE.to_string(),
            gui: true,
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
            mirror_preview: true,
            frame_timeout_ms: timing::DEFAULT_FRAME_TIMEOUT_MS,
            max_frames: None,
            display_sink: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(app_info::CONFIG_DIR_NAME)
                .join(app_info::CONFIG_FILE_NAME)
        })
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Read(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::Invalid("device must not be empty".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.frame_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Builder options for this config
    pub fn to_options(&self) -> PipelineOptions {
        PipelineOptions {
            source: CaptureSource::from_path(&self.device),
            want_gui: self.gui,
            width: self.width,
            height: self.height,
            mirror: self.mirror_preview,
            frame_timeout: Duration::from_millis(self.frame_timeout_ms),
            display_sink: self.display_sink.clone(),
        }
    }
}
