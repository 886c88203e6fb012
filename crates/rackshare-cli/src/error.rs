//! Error types for the rackshare command

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rackshare CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the rackshare CLI
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rack decoding error
    #[error(transparent)]
    Analyzer(#[from] rackshare_adg::Error),

    /// Decode did not finish within the per-file budget
    #[error("{}: exceeded time budget of {} s", .path.display(), .secs)]
    TimedOut { path: PathBuf, secs: u64 },

    /// Decode thread went away without reporting a result
    #[error("{}: decode thread panicked", .0.display())]
    DecodePanicked(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
