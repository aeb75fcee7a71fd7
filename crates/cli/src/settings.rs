use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use attention_core::attention::domain::attention_classifier::AttentionThresholds;
use attention_core::shared::constants::{DEFAULT_MIN_INTERVAL, DEFAULT_SAMPLE_EVERY, JPEG_QUALITY};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted defaults; command-line flags override them per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub thresholds: AttentionThresholds,
    pub sample_every: usize,
    /// Upper bound on verdicts per second.
    pub max_rate: f64,
    pub jpeg_quality: u8,
    /// Face-mesh model to download when none is cached.
    pub model_url: Option<String>,
    /// Face-detector model to download when none is cached.
    pub detector_model_url: Option<String>,
    pub intervention: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thresholds: AttentionThresholds::default(),
            sample_every: DEFAULT_SAMPLE_EVERY,
            max_rate: 1.0 / DEFAULT_MIN_INTERVAL,
            jpeg_quality: JPEG_QUALITY,
            model_url: None,
            detector_model_url: None,
            intervention: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|d| d.join("MindlessAttractor").join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Loads from the user config dir, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                log::debug!("Using default settings: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
