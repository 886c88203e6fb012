//! Rack analysis data model.
//!
//! These are the values handed back to callers. They serialize to the JSON
//! shape stored alongside an uploaded rack and can be read back for display
//! without touching the original file again.

use crate::edition::Edition;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of device group at the root of a rack preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RackType {
    /// Audio Effect Rack
    AudioEffectGroupDevice,
    /// Instrument Rack
    InstrumentGroupDevice,
    /// MIDI Effect Rack
    MidiEffectGroupDevice,
    /// Drum Rack
    DrumGroupDevice,
    /// A device group this analyzer does not know (yet)
    #[serde(rename = "UnknownDeviceGroup")]
    Unknown,
}

impl RackType {
    /// Classify a device element tag. Returns `None` for tags that are not
    /// device groups at all.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "AudioEffectGroupDevice" => Some(RackType::AudioEffectGroupDevice),
            "InstrumentGroupDevice" => Some(RackType::InstrumentGroupDevice),
            "MidiEffectGroupDevice" => Some(RackType::MidiEffectGroupDevice),
            "DrumGroupDevice" => Some(RackType::DrumGroupDevice),
            other if other.ends_with("GroupDevice") => Some(RackType::Unknown),
            _ => None,
        }
    }

    /// Element tag used for this rack type in the document.
    pub fn tag(&self) -> &'static str {
        match self {
            RackType::AudioEffectGroupDevice => "AudioEffectGroupDevice",
            RackType::InstrumentGroupDevice => "InstrumentGroupDevice",
            RackType::MidiEffectGroupDevice => "MidiEffectGroupDevice",
            RackType::DrumGroupDevice => "DrumGroupDevice",
            RackType::Unknown => "UnknownDeviceGroup",
        }
    }

    /// Name shown in Live's browser.
    pub fn display_name(&self) -> &'static str {
        match self {
            RackType::AudioEffectGroupDevice => "Audio Effect Rack",
            RackType::InstrumentGroupDevice => "Instrument Rack",
            RackType::MidiEffectGroupDevice => "MIDI Effect Rack",
            RackType::DrumGroupDevice => "Drum Rack",
            RackType::Unknown => "Unknown Rack",
        }
    }

    /// Whether chains of this rack carry key/velocity zones.
    pub fn has_note_zones(&self) -> bool {
        matches!(
            self,
            RackType::InstrumentGroupDevice | RackType::DrumGroupDevice
        )
    }
}

impl fmt::Display for RackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Broad device family, used for display grouping and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// Native Live instrument
    Instrument,
    /// Native Live audio effect
    AudioEffect,
    /// Native Live MIDI effect
    MidiEffect,
    /// Any kind of rack (device group)
    Rack,
    /// VST2/VST3/AU plugin
    Plugin,
    /// Max for Live device
    MaxForLive,
    /// Tag not present in the device catalog
    Unknown,
}

/// Inclusive MIDI range (key or velocity zone of a chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    /// Lowest value
    pub min: u8,
    /// Highest value
    pub max: u8,
}

/// Drum pad assignment of a Drum Rack chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumPad {
    /// MIDI note that triggers the chain (0-127)
    pub midi_note: u8,
    /// Note name as Live displays it (C3 = 60)
    pub note_name: String,
    /// Choke group, if the chain is in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choke_group: Option<u8>,
}

/// One parallel signal path inside a rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// Chain name (defaulted to "Chain N" when the document has none)
    pub name: String,
    /// Whether the chain is soloed
    pub is_soloed: bool,
    /// Devices in signal-flow order
    pub devices: Vec<Device>,
    /// Key zone (Instrument and Drum racks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_range: Option<NoteRange>,
    /// Velocity zone (Instrument and Drum racks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_range: Option<NoteRange>,
    /// Pad assignment (Drum racks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drum_pad: Option<DrumPad>,
}

impl Chain {
    /// Create an empty, unsoloed chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_soloed: false,
            devices: Vec::new(),
            key_range: None,
            velocity_range: None,
            drum_pad: None,
        }
    }
}

/// A device inside a chain: effect, instrument, plugin or nested rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Name shown on the device title bar (user name if renamed)
    pub name: String,
    /// Catalog name of the device, independent of user renames
    pub standard_name: String,
    /// Lowercase element tag, e.g. `eq8` or `audioeffectgroupdevice`
    #[serde(rename = "type")]
    pub device_type: String,
    /// Device family
    pub category: DeviceCategory,
    /// Device on/off switch
    pub is_on: bool,
    /// Preset the device was loaded from, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
    /// Chains of a nested rack; `None` for plain devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<Chain>>,
}

impl Device {
    /// Whether this device is a rack with its own chains.
    pub fn is_group(&self) -> bool {
        self.chains.is_some()
    }

    /// Nested chains, empty for plain devices.
    pub fn nested_chains(&self) -> &[Chain] {
        self.chains.as_deref().unwrap_or(&[])
    }
}

/// A rack-level macro knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroControl {
    /// Macro slot (0-15)
    pub index: u8,
    /// Display name
    pub name: String,
    /// Knob position normalized to 0.0..=1.0
    pub value: f64,
}

/// Marker used when the authoring version cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Authoring application information recovered from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetails {
    /// Creator string, e.g. "Ableton Live 11.3.4"
    pub creator: String,
    /// Application version, e.g. "11.3.4", or [`UNKNOWN_VERSION`]
    pub version: String,
    /// Major application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u32>,
    /// Document schema major version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_major_version: Option<String>,
    /// Document schema minor version, e.g. "11.0_433"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_minor_version: Option<String>,
    /// Build revision hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Oldest Live release able to open the document, e.g. "11.0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_compatible_version: Option<String>,
}

impl VersionDetails {
    /// The "unknown version" sentinel.
    pub fn unknown() -> Self {
        Self {
            creator: "Unknown".to_string(),
            version: UNKNOWN_VERSION.to_string(),
            major: None,
            schema_major_version: None,
            schema_minor_version: None,
            revision: None,
            minimum_compatible_version: None,
        }
    }

    /// Whether an application version was found.
    pub fn is_known(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }
}

impl Default for VersionDetails {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Aggregate numbers over the whole device tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSummary {
    /// Top-level chains
    pub chain_count: usize,
    /// Devices at every nesting level
    pub device_count: usize,
    /// Deepest rack-in-rack level (0 = no nested racks)
    pub max_nesting_depth: usize,
    /// Device count per category
    pub category_counts: BTreeMap<DeviceCategory, usize>,
}

impl RackSummary {
    /// Compute the summary for a chain tree.
    pub fn from_chains(chains: &[Chain]) -> Self {
        let mut summary = RackSummary {
            chain_count: chains.len(),
            ..RackSummary::default()
        };

        let mut stack: Vec<(&Chain, usize)> = chains.iter().map(|c| (c, 0)).collect();
        while let Some((chain, depth)) = stack.pop() {
            for device in &chain.devices {
                summary.device_count += 1;
                *summary.category_counts.entry(device.category).or_insert(0) += 1;
                if let Some(nested) = &device.chains {
                    summary.max_nesting_depth = summary.max_nesting_depth.max(depth + 1);
                    stack.extend(nested.iter().map(|c| (c, depth + 1)));
                }
            }
        }

        summary
    }
}

/// Complete result of analyzing one rack file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RackAnalysis {
    /// Rack name (user name of the rack device, else the display name)
    pub name: String,
    /// Root device-group kind
    pub rack_type: RackType,
    /// Top-level chains
    pub chains: Vec<Chain>,
    /// Rack-level macros
    pub macro_controls: Vec<MacroControl>,
    /// Authoring application details
    #[serde(rename = "version_details")]
    pub version_info: VersionDetails,
    /// Minimum Live edition needed to open the rack
    pub required_edition: Edition,
    /// Tree statistics
    pub summary: RackSummary,
    /// Structural problems; non-empty means the tree is best-effort
    pub parsing_errors: Vec<String>,
    /// Non-blocking anomalies
    pub parsing_warnings: Vec<String>,
}

impl RackAnalysis {
    /// Whether the rack was only partially understood.
    pub fn has_errors(&self) -> bool {
        !self.parsing_errors.is_empty()
    }

    /// All devices, nested ones included, in depth-first signal order.
    ///
    /// A nested rack comes before the devices of its own chains, which come
    /// before the device following the rack.
    pub fn flatten_devices(&self) -> Vec<&Device> {
        flatten_chains(&self.chains)
    }

    /// Standard names of all devices, in [`flatten_devices`](Self::flatten_devices) order.
    pub fn device_names(&self) -> Vec<&str> {
        self.flatten_devices()
            .into_iter()
            .map(|d| d.standard_name.as_str())
            .collect()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read back a previously serialized analysis.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Depth-first flattening of a chain tree without native recursion.
pub fn flatten_chains(chains: &[Chain]) -> Vec<&Device> {
    let mut out = Vec::new();
    let mut stack: Vec<&Device> = chains
        .iter()
        .rev()
        .flat_map(|c| c.devices.iter().rev())
        .collect();

    while let Some(device) = stack.pop() {
        out.push(device);
        stack.extend(
            device
                .nested_chains()
                .iter()
                .rev()
                .flat_map(|c| c.devices.iter().rev()),
        );
    }

    out
}
