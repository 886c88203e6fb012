//! Rack file decoder.
//!
//! Turns a gzip-compressed rack preset into a [`RackAnalysis`]:
//!
//! ```text
//! .adg file
//!   ↓ [gunzip, size-capped]
//! XML text
//!   ↓ [roxmltree]
//! RackDocument
//!   ↓ [detect_rack_type]        → rack kind + anchor device
//!   ↓ [parse_chains_and_devices] → chains, devices, macros, diagnostics
//!   ↓ [extract_version_info]    → authoring version
//! RackAnalysis
//! ```
//!
//! The XML text and the tree live only for the duration of one call.

mod decompress;
mod document;
mod macros;
mod rack_type;
mod version;
mod walk;

use std::path::Path;

use crate::config::AnalyzerConfig;
use crate::edition::required_edition_for_chains;
use crate::error::Result;
use crate::types::{RackAnalysis, RackSummary, RackType, VersionDetails};

pub use decompress::{decompress_bytes, decompress_file, is_gzip_magic, GZIP_MAGIC};
pub use document::{RackDocument, ROOT_TAG};
pub use macros::{normalize_macro_value, CLASSIC_MACRO_COUNT, MAX_MACROS};
pub use rack_type::{detect_rack_type, RackTypeInfo};
pub use version::{extract_version_info, NEWEST_SUPPORTED_MAJOR};
pub use walk::{note_name, parse_chains_and_devices, RackInfo};

/// Decoder for rack preset files.
///
/// Holds only its configuration, so one decoder can be shared between
/// threads and used for any number of files.
#[derive(Debug, Clone, Default)]
pub struct RackFileDecoder {
    config: AnalyzerConfig,
}

impl RackFileDecoder {
    /// Create a decoder with a validated configuration.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Decompress and parse `path`, then hand the document to `f`.
    ///
    /// The decompressed text and the parsed tree are dropped when `f`
    /// returns. Fails with `CorruptFile` if the file is not a gzip-wrapped
    /// XML document.
    pub fn decompress_and_parse<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&RackDocument<'_>) -> T,
    ) -> Result<T> {
        let xml = decompress_file(path, self.config.max_decompressed_bytes)?;
        let doc = RackDocument::parse(&xml, path)?;
        Ok(f(&doc))
    }

    /// Same as [`decompress_and_parse`](Self::decompress_and_parse) for
    /// file contents already in memory.
    pub fn decompress_and_parse_bytes<T>(
        &self,
        bytes: &[u8],
        label: &Path,
        f: impl FnOnce(&RackDocument<'_>) -> T,
    ) -> Result<T> {
        let xml = decompress_bytes(bytes, label, self.config.max_decompressed_bytes)?;
        let doc = RackDocument::parse(&xml, label)?;
        Ok(f(&doc))
    }

    /// Classify the rack kind of a parsed document.
    pub fn detect_rack_type<'a, 'input>(
        &self,
        doc: &'a RackDocument<'input>,
    ) -> RackTypeInfo<'a, 'input> {
        detect_rack_type(doc)
    }

    /// Walk the chain/device tree of a parsed document.
    pub fn parse_chains_and_devices(
        &self,
        doc: &RackDocument<'_>,
        display_name: &str,
    ) -> RackInfo {
        let type_info = detect_rack_type(doc);
        parse_chains_and_devices(&type_info, display_name, &self.config)
    }

    /// Read authoring version markers of a parsed document.
    pub fn extract_version_info(&self, doc: &RackDocument<'_>) -> VersionDetails {
        extract_version_info(doc)
    }

    /// Analyze the rack file at `path`.
    ///
    /// `display_name` is only used in diagnostics and as the rack name when
    /// the rack device has no user name; it defaults to the file stem.
    pub fn analyze_file(&self, path: &Path, display_name: Option<&str>) -> Result<RackAnalysis> {
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| default_display_name(path));
        log::debug!("Analyzing rack '{}' from {}", display_name, path.display());
        self.decompress_and_parse(path, |doc| self.analyze_document(doc, &display_name))
    }

    /// Analyze rack file contents already in memory.
    pub fn analyze_bytes(&self, bytes: &[u8], display_name: &str) -> Result<RackAnalysis> {
        self.decompress_and_parse_bytes(bytes, Path::new(display_name), |doc| {
            self.analyze_document(doc, display_name)
        })
    }

    /// Run every analysis stage over a parsed document.
    pub fn analyze_document(&self, doc: &RackDocument<'_>, display_name: &str) -> RackAnalysis {
        let type_info = self.detect_rack_type(doc);
        let rack = parse_chains_and_devices(&type_info, display_name, &self.config);
        let version_info = self.extract_version_info(doc);

        let mut diags = rack.diagnostics;
        if !doc.has_live_root() {
            diags.warn(format!(
                "Rack '{}': root element is <{}>, expected <{}>",
                display_name,
                doc.root().tag_name().name(),
                ROOT_TAG
            ));
        }
        if type_info.rack_type == RackType::Unknown {
            if let Some(tag) = type_info.anchor_tag() {
                diags.warn(format!(
                    "Rack '{}': unrecognized rack type <{}>, analyzed as a generic device group",
                    display_name, tag
                ));
            }
        }
        if !version_info.is_known() {
            diags.warn(format!(
                "Rack '{}': no authoring version information found",
                display_name
            ));
        } else if let Some(major) = version_info.major.filter(|m| *m > NEWEST_SUPPORTED_MAJOR) {
            diags.warn(format!(
                "Rack '{}': saved with Live {}, newer than the newest supported release (Live {})",
                display_name, major, NEWEST_SUPPORTED_MAJOR
            ));
        }

        let summary = RackSummary::from_chains(&rack.chains);
        let required_edition = required_edition_for_chains(&rack.chains);
        let (parsing_errors, parsing_warnings) = diags.into_parts();

        if parsing_errors.is_empty() {
            log::info!(
                "Analyzed rack '{}': {} with {} chains, {} devices, edition {}",
                display_name,
                type_info.rack_type,
                summary.chain_count,
                summary.device_count,
                required_edition
            );
        } else {
            log::warn!(
                "Rack '{}' analyzed with {} parsing errors; structure is best-effort",
                display_name,
                parsing_errors.len()
            );
        }

        RackAnalysis {
            name: rack.name,
            rack_type: type_info.rack_type,
            chains: rack.chains,
            macro_controls: rack.macro_controls,
            version_info,
            required_edition,
            summary,
            parsing_errors,
            parsing_warnings,
        }
    }
}

fn default_display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
