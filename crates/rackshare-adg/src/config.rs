//! Analyzer configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default nesting cap for racks inside racks.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Largest accepted nesting cap. The tree walk recurses once per level.
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Default limit for the decompressed XML payload (256 MiB).
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: u64 = 256 * 1024 * 1024;

/// Full-scale value of a macro knob as stored in the document.
pub const DEFAULT_MACRO_NATIVE_MAX: f64 = 127.0;

/// Tunables for a [`RackFileDecoder`](crate::RackFileDecoder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum rack-in-rack nesting depth that is walked
    pub max_depth: usize,
    /// Maximum size of the decompressed XML document in bytes
    pub max_decompressed_bytes: u64,
    /// Native value that maps to a normalized macro value of 1.0
    pub macro_native_max: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
            macro_native_max: DEFAULT_MACRO_NATIVE_MAX,
        }
    }
}

impl AnalyzerConfig {
    /// Check that the configuration can be used for decoding.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(Error::Config(format!(
                "max_depth must be at most {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        if self.max_decompressed_bytes == 0 {
            return Err(Error::Config(
                "max_decompressed_bytes must be greater than 0".to_string(),
            ));
        }
        if !self.macro_native_max.is_finite() || self.macro_native_max <= 0.0 {
            return Err(Error::Config(format!(
                "macro_native_max must be a positive number, got {}",
                self.macro_native_max
            )));
        }
        Ok(())
    }

    /// Builder-style override of the nesting cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
