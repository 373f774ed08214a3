//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the `otps2.toml`
//! file. It configures where the OTPS2 shared library is searched for and the
//! default time grid used by the `otps2-predict` command line tool.
//!
//! ```toml
//! [library]
//! # path = "/opt/otps2/lib/libotps2_.so"
//! directory = "/opt/otps2/lib"
//! search_path = ["/usr/local/lib"]
//!
//! [prediction]
//! ntime = 24
//! delta_time = 3600.0
//! ```

use crate::error::{Otps2Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration filename, looked up in the working directory
pub const CONFIG_FILE: &str = "otps2.toml";

/// Binding configuration loaded from `otps2.toml`
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Shared library search configuration
    pub library: LibraryConfig,
    /// Defaults for command line predictions
    pub prediction: PredictionConfig,
}

/// Where to find the OTPS2 shared library
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Exact library file; skips the directory search when set
    pub path: Option<PathBuf>,
    /// Directory probed first (defaults to the executable's directory)
    pub directory: Option<PathBuf>,
    /// Extra directories probed in order after `directory`
    pub search_path: Vec<PathBuf>,
}

/// Default time grid for the command line tool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Number of samples
    pub ntime: usize,
    /// Sample spacing in seconds
    pub delta_time: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        PredictionConfig {
            ntime: 24,
            delta_time: 3600.0, // hourly
        }
    }
}

impl Config {
    /// Load configuration from `otps2.toml`
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file found, using defaults");
            return Self::default();
        }
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration, surfacing read and parse errors
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&contents)
            .map_err(|e| Otps2Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| Otps2Error::Config(e.to_string()))?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
