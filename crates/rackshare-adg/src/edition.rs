//! Minimum Live edition detection.
//!
//! Live ships in three editions. Intro contains a subset of the devices,
//! Standard adds more, and some devices only exist in Suite. A rack can only
//! be opened in an edition that contains every device it uses, so the
//! required edition is decided by the "most expensive" device in the tree.
//!
//! Plugin and Max devices are not classified. Unrecognized names, such as
//! devices newer than this table, count as Intro.

use crate::types::{flatten_chains, Chain, DeviceCategory, RackAnalysis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Live product edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Live Intro
    #[default]
    Intro,
    /// Live Standard
    Standard,
    /// Live Suite
    Suite,
}

impl Edition {
    /// Lowercase edition name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Intro => "intro",
            Edition::Standard => "standard",
            Edition::Suite => "suite",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INTRO_DEVICES: &[&str] = &[
    // Racks
    "Audio Effect Rack",
    "Instrument Rack",
    "MIDI Effect Rack",
    "Drum Rack",
    // Instruments
    "Drift",
    "Simpler",
    "Impulse",
    "Drum Sampler",
    // Audio effects
    "Auto Filter",
    "Auto Pan",
    "Beat Repeat",
    "Channel EQ",
    "Chorus-Ensemble",
    "Compressor",
    "Delay",
    "Drum Buss",
    "EQ Three",
    "Erosion",
    "Filter Delay",
    "Gate",
    "Glue Compressor",
    "Grain Delay",
    "Limiter",
    "Looper",
    "Phaser-Flanger",
    "Redux",
    "Reverb",
    "Saturator",
    "Tuner",
    "Utility",
    // MIDI effects
    "Arpeggiator",
    "Chord",
    "Note Length",
    "Pitch",
    "Random",
    "Scale",
    "Velocity",
];

const STANDARD_DEVICES: &[&str] = &[
    "Operator",
    "External Instrument",
    "EQ Eight",
    "Auto Shift",
    "Dynamic Tube",
    "Echo",
    "External Audio Effect",
    "Frequency Shifter",
    "Multiband Dynamics",
    "Overdrive",
    "Pedal",
    "Resonators",
    "Shifter",
    "Spectrum",
    "Vinyl Distortion",
    "Vocoder",
    // Legacy devices still found in older racks
    "Chorus",
    "Phaser",
    "Flanger",
    "Simple Delay",
    "Ping Pong Delay",
];

const SUITE_DEVICES: &[&str] = &[
    "Wavetable",
    "Analog",
    "Collision",
    "Electric",
    "Tension",
    "Sampler",
    "Meld",
    "Amp",
    "Cabinet",
    "Corpus",
    "Hybrid Reverb",
    "Roar",
    "Spectral Resonator",
    "Spectral Time",
    "Granulator II",
    "Granulator III",
];

struct EditionTables {
    intro: HashSet<String>,
    intro_and_standard: HashSet<String>,
    suite: HashSet<String>,
}

static TABLES: OnceLock<EditionTables> = OnceLock::new();

fn tables() -> &'static EditionTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> EditionTables {
    let normalized = |names: &[&str]| -> HashSet<String> {
        names.iter().map(|n| normalize_device_name(n)).collect()
    };

    let intro = normalized(INTRO_DEVICES);
    let mut intro_and_standard = intro.clone();
    intro_and_standard.extend(normalized(STANDARD_DEVICES));

    EditionTables {
        intro,
        intro_and_standard,
        suite: normalized(SUITE_DEVICES),
    }
}

const NAME_PREFIXES: &[&str] = &["ableton", "live", "device"];
const NAME_SUFFIXES: &[&str] = &["device", "effect", "instrument"];

/// Reduce a device name to the form used for table lookups.
///
/// Strips cosmetic "Ableton"/"Live"/"Device" prefixes and
/// "Device"/"Effect"/"Instrument" suffixes, trims and lowercases, so that
/// `"Ableton Reverb Device"` and `"reverb"` compare equal.
pub fn normalize_device_name(name: &str) -> String {
    let mut current = name.trim().to_lowercase();

    loop {
        let before = current.len();
        for prefix in NAME_PREFIXES {
            if let Some(rest) = current.strip_prefix(prefix) {
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    current = rest.trim_start().to_string();
                }
            }
        }
        for suffix in NAME_SUFFIXES {
            if let Some(rest) = current.strip_suffix(suffix) {
                if rest.is_empty() || rest.ends_with(char::is_whitespace) {
                    current = rest.trim_end().to_string();
                }
            }
        }
        if current.len() == before {
            break;
        }
    }

    current
}

/// Classification outcome with the devices that decided it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionReport {
    /// Minimum edition needed
    pub edition: Edition,
    /// Devices that only exist in Suite
    pub suite_devices: Vec<String>,
    /// Devices that need at least Standard
    pub standard_devices: Vec<String>,
}

/// Minimum edition needed for a list of device names.
///
/// Suite wins over Standard, Standard over Intro; an empty or entirely
/// unrecognized list is Intro.
pub fn required_edition<I, S>(device_names: I) -> Edition
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tables = tables();
    let mut edition = Edition::Intro;

    for name in device_names {
        let key = normalize_device_name(name.as_ref());
        if tables.suite.contains(&key) {
            return Edition::Suite;
        }
        if tables.intro_and_standard.contains(&key) && !tables.intro.contains(&key) {
            edition = Edition::Standard;
        }
    }

    edition
}

/// Like [`required_edition`] but also lists the deciding devices.
pub fn classify_devices<I, S>(device_names: I) -> EditionReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tables = tables();
    let mut suite_devices = Vec::new();
    let mut standard_devices = Vec::new();

    for name in device_names {
        let name = name.as_ref();
        let key = normalize_device_name(name);
        if tables.suite.contains(&key) {
            push_unique(&mut suite_devices, name);
        } else if tables.intro_and_standard.contains(&key) && !tables.intro.contains(&key) {
            push_unique(&mut standard_devices, name);
        }
    }

    let edition = if !suite_devices.is_empty() {
        Edition::Suite
    } else if !standard_devices.is_empty() {
        Edition::Standard
    } else {
        Edition::Intro
    };

    EditionReport {
        edition,
        suite_devices,
        standard_devices,
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Names of the devices that take part in classification.
///
/// Plugin and Max devices carry names chosen by third parties, which may
/// collide with Live's own device names, so they are left out.
fn native_device_names(chains: &[Chain]) -> Vec<&str> {
    flatten_chains(chains)
        .into_iter()
        .filter(|d| !matches!(d.category, DeviceCategory::Plugin | DeviceCategory::MaxForLive))
        .map(|d| d.standard_name.as_str())
        .collect()
}

/// Minimum edition for a chain tree, nested racks included.
pub fn required_edition_for_chains(chains: &[Chain]) -> Edition {
    required_edition(native_device_names(chains))
}

/// Minimum edition for a finished analysis, with the deciding devices.
pub fn classify_analysis(analysis: &RackAnalysis) -> EditionReport {
    classify_devices(native_device_names(&analysis.chains))
}
