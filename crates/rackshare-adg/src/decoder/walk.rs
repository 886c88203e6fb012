//! Chain and device tree walk.
//!
//! Layout of a rack device in the document:
//!
//! ```text
//! <AudioEffectGroupDevice>
//!   <Branches>
//!     <AudioEffectBranch>
//!       <Name Value="Dry" />
//!       <IsSoloed Value="false" />
//!       <DeviceChain>
//!         <AudioToAudioDeviceChain>
//!           <Devices>
//!             <Reverb> ... </Reverb>
//!             <AudioEffectGroupDevice> ... nested rack ... </AudioEffectGroupDevice>
//!           </Devices>
//!         </AudioToAudioDeviceChain>
//!       </DeviceChain>
//!     </AudioEffectBranch>
//!   </Branches>
//!   <MacroControls.0> ... </MacroControls.0>
//! </AudioEffectGroupDevice>
//! ```
//!
//! Child order inside `Branches` and `Devices` is signal order and is kept
//! as-is. Nested racks are followed up to the configured depth cap.

use super::document::{
    bool_of, child, element_children, manual_of, number_of, parse_bool, path, text_of,
};
use super::macros::extract_macro_controls;
use super::rack_type::RackTypeInfo;
use crate::catalog::{self, humanize_tag, is_group_tag};
use crate::config::AnalyzerConfig;
use crate::diagnostics::Diagnostics;
use crate::types::{Chain, Device, DeviceCategory, DrumPad, MacroControl, NoteRange, RackType};
use roxmltree::Node;
use std::fmt;

/// Structure recovered from the rack device.
#[derive(Debug, Clone, PartialEq)]
pub struct RackInfo {
    /// Rack name (user name of the rack device or the display name)
    pub name: String,
    /// Top-level chains
    pub chains: Vec<Chain>,
    /// The rack's own macros
    pub macro_controls: Vec<MacroControl>,
    /// Problems found along the way
    pub diagnostics: Diagnostics,
}

/// Walk the chains, devices and macros of the rack located by `type_info`.
///
/// Never fails. A missing rack device or a rack without a `Branches` section
/// is recorded as a parsing error and whatever could be read is returned.
/// The result depends only on the document and `config`.
pub fn parse_chains_and_devices(
    type_info: &RackTypeInfo<'_, '_>,
    display_name: &str,
    config: &AnalyzerConfig,
) -> RackInfo {
    let mut walker = Walker {
        config,
        rack_label: format!("Rack '{}'", display_name),
        diags: Diagnostics::new(),
    };

    let Some(anchor) = type_info.anchor else {
        walker.diags.error(format!(
            "{}: no device group element found in document",
            walker.rack_label
        ));
        return RackInfo {
            name: display_name.to_string(),
            chains: Vec::new(),
            macro_controls: Vec::new(),
            diagnostics: walker.diags,
        };
    };

    let name = text_of(anchor, "UserName")
        .map(str::to_string)
        .unwrap_or_else(|| display_name.to_string());

    let chains = walker.walk_group(anchor, 0, "");
    let macro_controls = extract_macro_controls(
        anchor,
        config.macro_native_max,
        &walker.rack_label,
        &mut walker.diags,
    );

    RackInfo {
        name,
        chains,
        macro_controls,
        diagnostics: walker.diags,
    }
}

struct Walker<'c> {
    config: &'c AnalyzerConfig,
    rack_label: String,
    diags: Diagnostics,
}

impl Walker<'_> {
    fn context(&self, location: &str) -> String {
        if location.is_empty() {
            self.rack_label.clone()
        } else {
            format!("{}, {}", self.rack_label, location)
        }
    }

    fn warn_at(&mut self, location: &str, message: impl fmt::Display) {
        let message = format!("{}: {}", self.context(location), message);
        self.diags.warn(message);
    }

    fn error_at(&mut self, location: &str, message: impl fmt::Display) {
        let message = format!("{}: {}", self.context(location), message);
        self.diags.error(message);
    }

    /// Chains of the group device `group`, which sits at nesting `depth`.
    fn walk_group(&mut self, group: Node<'_, '_>, depth: usize, location: &str) -> Vec<Chain> {
        let tag = group.tag_name().name();
        let rack_type = RackType::from_tag(tag).unwrap_or(RackType::Unknown);

        let Some(branches) = child(group, "Branches") else {
            self.error_at(
                location,
                format_args!("{} has no Branches section, its chains could not be read", tag),
            );
            return Vec::new();
        };

        let mut chains = Vec::new();
        for branch in element_children(branches) {
            let branch_tag = branch.tag_name().name();
            if !branch_tag.ends_with("Branch") {
                self.warn_at(
                    location,
                    format_args!("ignoring unexpected element <{}> in Branches", branch_tag),
                );
                continue;
            }
            let index = chains.len();
            let chain = self.parse_chain(branch, rack_type, index, depth, location);
            chains.push(chain);
        }

        chains
    }

    fn parse_chain(
        &mut self,
        branch: Node<'_, '_>,
        rack_type: RackType,
        index: usize,
        depth: usize,
        parent_location: &str,
    ) -> Chain {
        let location = join_location(parent_location, &format!("chain {}", index + 1));

        let name = match chain_name(branch) {
            Some(name) => name.to_string(),
            None => {
                self.warn_at(&location, "chain has no name, using default");
                format!("Chain {}", index + 1)
            }
        };

        let is_soloed = bool_of(branch, "IsSoloed").unwrap_or_else(|| {
            self.warn_at(&location, "missing or unreadable IsSoloed, assuming not soloed");
            false
        });

        let mut chain = Chain::new(name);
        chain.is_soloed = is_soloed;

        if rack_type.has_note_zones() {
            chain.key_range = zone(branch, "KeyRange");
            chain.velocity_range = zone(branch, "VelocityRange");
        }
        if rack_type == RackType::DrumGroupDevice {
            chain.drum_pad = self.drum_pad(branch, &location);
        }

        match device_list(branch) {
            Some(devices) => {
                for (device_index, device) in element_children(devices).enumerate() {
                    let device = self.parse_device(device, device_index, depth, &location);
                    chain.devices.push(device);
                }
            }
            None => self.warn_at(&location, "chain has no device list, treating it as empty"),
        }

        chain
    }

    fn parse_device(
        &mut self,
        node: Node<'_, '_>,
        index: usize,
        depth: usize,
        parent_location: &str,
    ) -> Device {
        let tag = node.tag_name().name();
        let location = join_location(parent_location, &format!("device {}", index + 1));

        let (mut standard_name, category) = match catalog::lookup(tag) {
            Some(info) => (info.standard_name.to_string(), info.category),
            None if is_group_tag(tag) => {
                self.warn_at(
                    &location,
                    format_args!("unknown rack type <{}>, reading it as a generic rack", tag),
                );
                (humanize_tag(tag), DeviceCategory::Rack)
            }
            None => {
                self.warn_at(&location, format_args!("unrecognized device type <{}>", tag));
                (humanize_tag(tag), DeviceCategory::Unknown)
            }
        };

        match category {
            DeviceCategory::Plugin => match plugin_name(node) {
                Some(name) => standard_name = name,
                None => self.warn_at(&location, "plugin device has no plugin description"),
            },
            DeviceCategory::MaxForLive => {
                if let Some(name) = max_patch_name(node) {
                    standard_name = name;
                }
            }
            _ => {}
        }

        // An empty UserName is Live's "not renamed"; a missing one is an anomaly
        let name = match child(node, "UserName") {
            Some(_) => text_of(node, "UserName")
                .map(str::to_string)
                .unwrap_or_else(|| standard_name.clone()),
            None => {
                self.warn_at(
                    &location,
                    format_args!(
                        "{} has no UserName field, using its standard name",
                        standard_name
                    ),
                );
                standard_name.clone()
            }
        };

        let is_on = manual_of(node, "On").and_then(parse_bool).unwrap_or_else(|| {
            self.warn_at(
                &location,
                format_args!("{} has no readable on/off state, assuming on", name),
            );
            true
        });

        let chains = if is_group_tag(tag) {
            let nested_depth = depth + 1;
            let max_depth = self.config.max_depth;
            if nested_depth > max_depth {
                self.warn_at(
                    &location,
                    format_args!(
                        "maximum nesting depth of {} exceeded, chains of '{}' were not read",
                        max_depth, name
                    ),
                );
                Some(Vec::new())
            } else {
                Some(self.walk_group(node, nested_depth, &location))
            }
        } else {
            None
        };

        Device {
            name,
            standard_name,
            device_type: tag.to_lowercase(),
            category,
            is_on,
            preset_name: preset_name(node),
            chains,
        }
    }

    fn drum_pad(&mut self, branch: Node<'_, '_>, location: &str) -> Option<DrumPad> {
        let info = child(branch, "BranchInfo").or_else(|| child(branch, "ZoneSettings"))?;
        let raw = number_of(info, "ReceivingNote")?;

        // Pads are stored inverted: ReceivingNote = 128 - MIDI note
        let note = 128.0 - raw;
        if !(0.0..=127.0).contains(&note) || note.fract() != 0.0 {
            self.warn_at(
                location,
                format_args!("drum pad ReceivingNote {} is out of range", raw),
            );
            return None;
        }
        let midi_note = note as u8;

        let choke_group = number_of(info, "ChokeGroup")
            .filter(|g| *g >= 1.0 && *g <= 16.0)
            .map(|g| g as u8);

        Some(DrumPad {
            midi_note,
            note_name: note_name(midi_note),
            choke_group,
        })
    }
}

fn join_location(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{} > {}", parent, segment)
    }
}

/// `<Name Value=".."/>` (Live 9-11) or `<Name><UserName/><EffectiveName/></Name>`.
fn chain_name<'a>(branch: Node<'a, '_>) -> Option<&'a str> {
    let name = child(branch, "Name")?;
    if let Some(value) = name.attribute("Value") {
        let value = value.trim();
        return (!value.is_empty()).then_some(value);
    }
    text_of(name, "UserName").or_else(|| text_of(name, "EffectiveName"))
}

fn zone(branch: Node<'_, '_>, tag: &str) -> Option<NoteRange> {
    let range = child(branch, tag).or_else(|| path(branch, &["ZoneSettings", tag]))?;
    let bound = |t: &str| number_of(range, t).map(|v| v.clamp(0.0, 127.0) as u8);
    match (bound("Min"), bound("Max")) {
        (None, None) => None,
        (min, max) => Some(NoteRange {
            min: min.unwrap_or(0),
            max: max.unwrap_or(127),
        }),
    }
}

fn device_list<'a, 'input>(branch: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    if let Some(device_chain) = child(branch, "DeviceChain") {
        let typed_chain = element_children(device_chain)
            .find(|n| n.tag_name().name().ends_with("DeviceChain"));
        if let Some(devices) = typed_chain.and_then(|c| child(c, "Devices")) {
            return Some(devices);
        }
        if let Some(devices) = child(device_chain, "Devices") {
            return Some(devices);
        }
    }
    child(branch, "Devices")
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Note name in Live's convention, where MIDI 60 is C3.
pub fn note_name(midi_note: u8) -> String {
    let octave = i32::from(midi_note / 12) - 2;
    format!("{}{}", NOTE_NAMES[usize::from(midi_note % 12)], octave)
}

/// Display name of a `FileRef`: its `Name`, or the file stem of its path.
fn file_ref_name(file_ref: Node<'_, '_>) -> Option<String> {
    let raw = text_of(file_ref, "Name")
        .or_else(|| text_of(file_ref, "Path"))
        .or_else(|| text_of(file_ref, "RelativePath"))?;
    let file = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Preset the device was loaded from. Live's built-in default presets are
/// not reported.
fn preset_name(node: Node<'_, '_>) -> Option<String> {
    path(node, &["LastPresetRef", "Value", "FilePresetRef", "FileRef"]).and_then(file_ref_name)
}

fn plugin_name(node: Node<'_, '_>) -> Option<String> {
    let desc = child(node, "PluginDesc")?;
    let info = element_children(desc).next()?;
    text_of(info, "PlugName")
        .or_else(|| text_of(info, "Name"))
        .map(str::to_string)
}

fn max_patch_name(node: Node<'_, '_>) -> Option<String> {
    let scope = child(node, "PatchSlot").unwrap_or(node);
    scope
        .descendants()
        .filter(|n| n.has_tag_name("FileRef"))
        .find_map(file_ref_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::document::RackDocument;
    use crate::decoder::rack_type::detect_rack_type;
    use std::path::Path;

    fn walk(xml: &str, config: &AnalyzerConfig) -> RackInfo {
        let doc = RackDocument::parse(xml, Path::new("t")).unwrap();
        let info = detect_rack_type(&doc);
        parse_chains_and_devices(&info, "Test", config)
    }

    fn wrap(rack: &str) -> String {
        format!(
            "<Ableton><GroupDevicePreset><Device>{}</Device></GroupDevicePreset></Ableton>",
            rack
        )
    }

    const ON: &str = r#"<On><Manual Value="true" /></On>"#;
    const UNNAMED: &str = r#"<UserName Value="" />"#;

    #[test]
    fn test_keeps_device_order() {
        let xml = wrap(&format!(
            r#"<AudioEffectGroupDevice>
                <Branches>
                    <AudioEffectBranch>
                        <Name Value="Main" />
                        <IsSoloed Value="true" />
                        <DeviceChain><AudioToAudioDeviceChain><Devices>
                            <Eq8>{ON}{UNNAMED}</Eq8>
                            <Compressor2>{ON}<UserName Value="Squash" /></Compressor2>
                            <Reverb><On><Manual Value="false" /></On>{UNNAMED}</Reverb>
                        </Devices></AudioToAudioDeviceChain></DeviceChain>
                    </AudioEffectBranch>
                </Branches>
            </AudioEffectGroupDevice>"#
        ));

        let info = walk(&xml, &AnalyzerConfig::default());
        assert!(info.diagnostics.errors().is_empty());
        assert!(info.diagnostics.warnings().is_empty());

        let chain = &info.chains[0];
        assert_eq!(chain.name, "Main");
        assert!(chain.is_soloed);
        let names: Vec<&str> = chain.devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["EQ Eight", "Squash", "Reverb"]);
        assert_eq!(chain.devices[1].standard_name, "Compressor");
        assert_eq!(chain.devices[0].device_type, "eq8");
        assert!(!chain.devices[2].is_on);
        assert!(chain.devices.iter().all(|d| d.chains.is_none()));
    }

    #[test]
    fn test_missing_branches_is_error() {
        let xml = wrap("<InstrumentGroupDevice><UserName Value=\"Keys\" /></InstrumentGroupDevice>");
        let info = walk(&xml, &AnalyzerConfig::default());
        assert_eq!(info.name, "Keys");
        assert!(info.chains.is_empty());
        assert_eq!(info.diagnostics.errors().len(), 1);
        assert!(info.diagnostics.errors()[0].contains("Branches"));
    }

    #[test]
    fn test_missing_anchor_is_error() {
        let info = walk("<Ableton />", &AnalyzerConfig::default());
        assert!(info.chains.is_empty());
        assert!(info.diagnostics.has_errors());
        assert_eq!(info.name, "Test");
    }

    #[test]
    fn test_defaults_with_warnings() {
        let xml = wrap(
            r#"<AudioEffectGroupDevice><Branches>
                <AudioEffectBranch>
                    <DeviceChain><AudioToAudioDeviceChain><Devices>
                        <Reverb />
                    </Devices></AudioToAudioDeviceChain></DeviceChain>
                </AudioEffectBranch>
            </Branches></AudioEffectGroupDevice>"#,
        );
        let info = walk(&xml, &AnalyzerConfig::default());
        let chain = &info.chains[0];
        assert_eq!(chain.name, "Chain 1");
        assert!(!chain.is_soloed);
        assert!(chain.devices[0].is_on);

        let warnings = info.diagnostics.warnings();
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("chain 1"));
        assert!(warnings[2].contains("chain 1 > device 1"));
        assert!(warnings[2].contains("no UserName field"));
        assert!(warnings[3].contains("chain 1 > device 1"));
        assert!(!info.diagnostics.has_errors());
    }

    #[test]
    fn test_missing_user_name_field_warns() {
        let xml = wrap(&format!(
            r#"<AudioEffectGroupDevice><Branches>
                <AudioEffectBranch>
                    <Name Value="Main" /><IsSoloed Value="false" />
                    <DeviceChain><AudioToAudioDeviceChain><Devices>
                        <Reverb>{ON}{UNNAMED}</Reverb>
                        <Delay>{ON}</Delay>
                    </Devices></AudioToAudioDeviceChain></DeviceChain>
                </AudioEffectBranch>
            </Branches></AudioEffectGroupDevice>"#
        ));
        let info = walk(&xml, &AnalyzerConfig::default());
        let devices = &info.chains[0].devices;
        assert_eq!(devices[0].name, "Reverb");
        assert_eq!(devices[1].name, "Delay");

        let warnings = info.diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("chain 1 > device 2"));
        assert!(warnings[0].contains("no UserName field"));
    }

    #[test]
    fn test_drum_pad_and_zones() {
        let xml = wrap(
            r#"<DrumGroupDevice><Branches>
                <DrumBranch>
                    <Name Value="Kick" />
                    <IsSoloed Value="false" />
                    <BranchInfo>
                        <ReceivingNote Value="92" />
                        <ChokeGroup Value="1" />
                    </BranchInfo>
                    <ZoneSettings>
                        <KeyRange><Min Value="0" /><Max Value="127" /></KeyRange>
                        <VelocityRange><Min Value="1" /><Max Value="127" /></VelocityRange>
                    </ZoneSettings>
                    <DeviceChain><MidiToAudioDeviceChain><Devices /></MidiToAudioDeviceChain></DeviceChain>
                </DrumBranch>
            </Branches></DrumGroupDevice>"#,
        );
        let info = walk(&xml, &AnalyzerConfig::default());
        let chain = &info.chains[0];
        let pad = chain.drum_pad.as_ref().unwrap();
        assert_eq!(pad.midi_note, 36);
        assert_eq!(pad.note_name, "C1");
        assert_eq!(pad.choke_group, Some(1));
        assert_eq!(chain.velocity_range, Some(NoteRange { min: 1, max: 127 }));
        assert_eq!(chain.key_range, Some(NoteRange { min: 0, max: 127 }));
    }

    #[test]
    fn test_plugin_and_preset_names() {
        let xml = wrap(&format!(
            r#"<InstrumentGroupDevice><Branches>
                <InstrumentBranch>
                    <Name Value="Lead" /><IsSoloed Value="false" />
                    <DeviceChain><MidiToAudioDeviceChain><Devices>
                        <PluginDevice>{ON}
                            <PluginDesc><VstPluginInfo><PlugName Value="Serum" /></VstPluginInfo></PluginDesc>
                        </PluginDevice>
                        <Reverb>{ON}
                            <LastPresetRef><Value><FilePresetRef><FileRef>
                                <Path Value="/Users/me/Presets/Big Hall.adv" />
                            </FileRef></FilePresetRef></Value></LastPresetRef>
                        </Reverb>
                        <MxDeviceAudioEffect>{ON}
                            <PatchSlot><Value><MxPatchRef><FileRef>
                                <Name Value="LFO.amxd" />
                            </FileRef></MxPatchRef></Value></PatchSlot>
                        </MxDeviceAudioEffect>
                    </Devices></MidiToAudioDeviceChain></DeviceChain>
                </InstrumentBranch>
            </Branches></InstrumentGroupDevice>"#
        ));
        let info = walk(&xml, &AnalyzerConfig::default());
        let devices = &info.chains[0].devices;
        assert_eq!(devices[0].name, "Serum");
        assert_eq!(devices[0].category, DeviceCategory::Plugin);
        assert_eq!(devices[1].preset_name.as_deref(), Some("Big Hall"));
        assert_eq!(devices[2].standard_name, "LFO");
        assert_eq!(devices[2].category, DeviceCategory::MaxForLive);
    }

    #[test]
    fn test_depth_cap() {
        fn nest(levels: usize) -> String {
            if levels == 0 {
                return format!("<Reverb>{ON}</Reverb>");
            }
            format!(
                r#"<AudioEffectGroupDevice>{ON}<Branches><AudioEffectBranch>
                    <Name Value="L{levels}" /><IsSoloed Value="false" />
                    <DeviceChain><AudioToAudioDeviceChain><Devices>{}</Devices></AudioToAudioDeviceChain></DeviceChain>
                </AudioEffectBranch></Branches></AudioEffectGroupDevice>"#,
                nest(levels - 1)
            )
        }

        let xml = wrap(&nest(5));
        let config = AnalyzerConfig::default().with_max_depth(2);
        let info = walk(&xml, &config);

        let depth_warnings: Vec<_> = info
            .diagnostics
            .warnings()
            .iter()
            .filter(|w| w.contains("depth"))
            .collect();
        assert_eq!(depth_warnings.len(), 1);
        assert!(!info.diagnostics.has_errors());

        // anchor -> depth 1 -> depth 2 -> truncated
        let level1 = &info.chains[0].devices[0];
        let level2 = &level1.nested_chains()[0].devices[0];
        let level3 = &level2.nested_chains()[0].devices[0];
        assert!(level2.is_group());
        assert_eq!(level3.chains, Some(Vec::new()));
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(60), "C3");
        assert_eq!(note_name(36), "C1");
        assert_eq!(note_name(0), "C-2");
        assert_eq!(note_name(127), "G8");
    }
}
