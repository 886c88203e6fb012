//! Ableton Live rack preset analysis for RackShare.
//!
//! This crate reads `.adg` rack presets (gzip-compressed XML) and produces a
//! structured description of the rack:
//! - Rack type (Audio Effect, Instrument, MIDI Effect or Drum Rack)
//! - Chains and their devices in signal order, nested racks included
//! - Macro controls normalized to 0.0..=1.0
//! - Authoring Live version
//! - The minimum Live edition needed to open the rack
//!
//! # Error model
//!
//! A file that cannot be read as gzip-wrapped XML fails with
//! [`Error::CorruptFile`]. Anything wrong *inside* a readable document is
//! recorded on the result instead: `parsing_errors` when the structure could
//! only be partially understood, `parsing_warnings` for isolated defaults.
//!
//! # Example
//!
//! ```ignore
//! use rackshare_adg::{AnalyzerConfig, RackFileDecoder};
//!
//! let decoder = RackFileDecoder::new(AnalyzerConfig::default())?;
//! let analysis = decoder.analyze_file(Path::new("uploads/bass.adg"), Some("Bass Mangler"))?;
//!
//! println!("{} needs Live {}", analysis.name, analysis.required_edition);
//! let json = analysis.to_json()?;
//! ```

pub mod catalog;
pub mod config;
pub mod decoder;
pub mod diagnostics;
pub mod edition;
pub mod error;
pub mod types;

pub use config::AnalyzerConfig;
pub use decoder::{RackDocument, RackFileDecoder, RackInfo, RackTypeInfo};
pub use diagnostics::Diagnostics;
pub use edition::{classify_analysis, classify_devices, required_edition, Edition, EditionReport};
pub use error::{Error, Result};
pub use types::*;

use std::path::Path;

/// Analyze a rack file with the default configuration.
pub fn analyze_rack_file<P: AsRef<Path>>(path: P) -> Result<RackAnalysis> {
    RackFileDecoder::default().analyze_file(path.as_ref(), None)
}
