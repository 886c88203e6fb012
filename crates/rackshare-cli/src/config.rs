//! Configuration file support for rackshare
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/rackshare/config.toml`
//! - macOS: `~/Library/Application Support/rackshare/config.toml`
//! - Windows: `%APPDATA%\rackshare\config.toml`

use crate::error::{Error, Result};
use directories::ProjectDirs;
use rackshare_adg::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_JOBS: usize = 8;

/// Default wall-clock budget per file.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder settings
    pub analyzer: AnalyzerConfig,
    /// Batch processing settings
    pub batch: BatchSettings,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(Error::Config(_)) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable config file: {}", e);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "rackshare") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        self.analyzer.validate()?;
        self.batch.validate()
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, default_config_text())?;
        Ok(path)
    }
}

/// Commented default configuration, as written by `rackshare init`.
pub fn default_config_text() -> String {
    format!(
        r#"# rackshare configuration file

[analyzer]
# Deepest rack-in-rack level that is still read
max_depth = {max_depth}

# Largest decompressed document accepted, in bytes
max_decompressed_bytes = {max_bytes}

# Native full-scale value of macro knobs
macro_native_max = {macro_max:.1}

[batch]
# Worker threads used by `rackshare analyze`
jobs = {jobs}

# Wall-clock budget per file, in seconds
timeout_secs = {timeout}
"#,
        max_depth = rackshare_adg::config::DEFAULT_MAX_DEPTH,
        max_bytes = rackshare_adg::config::DEFAULT_MAX_DECOMPRESSED_BYTES,
        macro_max = rackshare_adg::config::DEFAULT_MACRO_NATIVE_MAX,
        jobs = default_jobs(),
        timeout = DEFAULT_TIMEOUT_SECS,
    )
}

/// Worker count when none is configured.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_JOBS)
}

/// Batch processing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Worker threads
    pub jobs: usize,
    /// Per-file budget in seconds
    pub timeout_secs: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BatchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(Error::Config("batch.jobs must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "batch.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
