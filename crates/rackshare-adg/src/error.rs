use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing a rack file
///
/// Only conditions that prevent *any* analysis from being produced are
/// represented here. Problems inside an otherwise readable document are
/// collected as `parsing_errors` / `parsing_warnings` on the analysis instead.
///
/// # Common failures
///
/// - A file that is not gzip at all (an `.adv`, a zip, a renamed WAV)
/// - A gzip stream that was cut off during upload
/// - A gzip payload that is not XML, or is XML without a root element
#[derive(Error, Debug)]
pub enum Error {
    /// The file could not be turned into an XML document
    ///
    /// This covers bad gzip magic, truncated or invalid deflate data,
    /// payloads that are not UTF-8, malformed XML and payloads larger than
    /// the configured decompression limit. Callers should treat this as an
    /// expected outcome for user uploads rather than a programming error.
    #[error("Corrupt rack file {}: {reason}", path.display())]
    CorruptFile {
        /// File (or display label for in-memory input) that failed
        path: PathBuf,
        /// Human-readable reason
        reason: String,
    },

    /// Input/Output error when opening or reading the file
    ///
    /// Missing files and permission problems end up here, not in
    /// `CorruptFile`: the bytes were never seen.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization of an analysis failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid analyzer configuration
    #[error("Invalid analyzer configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a `CorruptFile` error for `path`.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is the tier-1 "could not read the rack at all" condition.
    pub fn is_corrupt_file(&self) -> bool {
        matches!(self, Error::CorruptFile { .. })
    }
}
