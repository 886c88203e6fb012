//! Authoring application version markers.
//!
//! The root element carries them as attributes:
//!
//! ```text
//! <Ableton MajorVersion="5" MinorVersion="11.0_433" SchemaChangeCount="3"
//!          Creator="Ableton Live 11.3.4" Revision="...">
//! ```
//!
//! `MinorVersion` is the schema revision, whose leading `11.0` is the oldest
//! release that can load the file. `Creator` names the release that saved it.

use super::document::RackDocument;
use crate::types::{VersionDetails, UNKNOWN_VERSION};

/// Newest Live major release this analyzer has been checked against.
pub const NEWEST_SUPPORTED_MAJOR: u32 = 12;

/// Read version markers from the root element.
///
/// Missing markers are not an error: the result is the
/// [`VersionDetails::unknown`] sentinel, filled in with whatever attributes
/// were present.
pub fn extract_version_info(doc: &RackDocument<'_>) -> VersionDetails {
    let root = doc.root();
    let attr = |name: &str| {
        root.attribute(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let creator = attr("Creator");
    let schema_minor_version = attr("MinorVersion");
    let minimum_compatible_version = schema_minor_version
        .as_deref()
        .and_then(schema_release);

    let version = creator
        .as_deref()
        .and_then(version_from_creator)
        .or_else(|| minimum_compatible_version.clone());

    let major = version.as_deref().and_then(leading_number);

    VersionDetails {
        creator: creator.unwrap_or_else(|| VersionDetails::unknown().creator),
        version: version.unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        major,
        schema_major_version: attr("MajorVersion"),
        schema_minor_version,
        revision: attr("Revision"),
        minimum_compatible_version,
    }
}

/// `"Ableton Live 11.3.4"` -> `"11.3.4"`, `"Ableton Live 12.0b5 Beta"` -> `"12.0b5"`.
fn version_from_creator(creator: &str) -> Option<String> {
    creator
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
}

/// `"11.0_433"` -> `"11.0"`; `None` when it doesn't look like `N.N`.
fn schema_release(minor: &str) -> Option<String> {
    let release = minor.split('_').next()?.trim();
    let mut parts = release.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if numeric(major) && numeric(minor) {
        Some(release.to_string())
    } else {
        None
    }
}

fn leading_number(version: &str) -> Option<u32> {
    let digits: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
