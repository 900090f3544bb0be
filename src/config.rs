//! Application configuration.
//!
//! Read from `voice101.json` in the working directory, or from the file named
//! by `VOICE101_CONFIG`. Every field is optional.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[cfg(feature = "xtts")]
use crate::engines::xtts::{Device, XttsModelParams};

pub const CONFIG_FILE: &str = "voice101.json";
pub const CONFIG_ENV: &str = "VOICE101_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Compute device the model should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceConfig {
    #[default]
    Cuda,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub model_name: String,
    pub language: String,
    pub device: DeviceConfig,
    pub preset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub poll_interval_ms: u64,
    /// Bound for each synthesis round trip. Absent means no bound.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            model_name: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            language: "en".to_string(),
            device: DeviceConfig::Cuda,
            preset_dir: PathBuf::from("presets"),
            output_dir: PathBuf::from("outputs"),
            poll_interval_ms: 1000,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields the defaults; a present but broken file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Create the preset and output directories if they are missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.preset_dir)?;
        fs::create_dir_all(&self.output_dir)
    }

    #[cfg(feature = "xtts")]
    pub fn xtts_params(&self) -> XttsModelParams {
        XttsModelParams {
            server_url: self.server_url.clone(),
            model_name: self.model_name.clone(),
            device: match self.device {
                DeviceConfig::Cuda => Device::Cuda,
                DeviceConfig::Cpu => Device::Cpu,
            },
            language: self.language.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
