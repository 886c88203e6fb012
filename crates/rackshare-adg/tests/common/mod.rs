//! Fixture builder for rack preset files.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const CREATOR: &str = "Ableton Live 11.3.4";

#[derive(Clone, Debug)]
pub struct DeviceSpec {
    pub tag: String,
    pub user_name: Option<String>,
    pub on: bool,
    pub chains: Option<Vec<ChainSpec>>,
}

#[derive(Clone, Debug)]
pub struct ChainSpec {
    pub name: String,
    pub devices: Vec<DeviceSpec>,
}

pub fn device(tag: &str) -> DeviceSpec {
    DeviceSpec {
        tag: tag.to_string(),
        user_name: None,
        on: true,
        chains: None,
    }
}

pub fn rack(tag: &str, chains: Vec<ChainSpec>) -> DeviceSpec {
    DeviceSpec {
        chains: Some(chains),
        ..device(tag)
    }
}

pub fn chain(name: &str, devices: Vec<DeviceSpec>) -> ChainSpec {
    ChainSpec {
        name: name.to_string(),
        devices,
    }
}

/// Audio effect racks nested `levels` deep around a single Reverb.
pub fn nested_audio_racks(levels: usize) -> DeviceSpec {
    let mut current = device("Reverb");
    for level in 0..levels {
        current = rack(
            "AudioEffectGroupDevice",
            vec![chain(&format!("Level {}", level), vec![current])],
        );
    }
    current
}

fn branch_tags(rack_tag: &str) -> (&'static str, &'static str) {
    match rack_tag {
        "InstrumentGroupDevice" => ("InstrumentBranch", "MidiToAudioDeviceChain"),
        "DrumGroupDevice" => ("DrumBranch", "MidiToAudioDeviceChain"),
        "MidiEffectGroupDevice" => ("MidiEffectBranch", "MidiToMidiDeviceChain"),
        _ => ("AudioEffectBranch", "AudioToAudioDeviceChain"),
    }
}

fn write_device(out: &mut String, device: &DeviceSpec) {
    let _ = write!(out, "<{} Id=\"0\">", device.tag);
    let _ = write!(out, "<On><Manual Value=\"{}\" /></On>", device.on);
    let user_name = device.user_name.as_deref().unwrap_or("");
    let _ = write!(out, "<UserName Value=\"{}\" />", user_name);
    if let Some(chains) = &device.chains {
        write_branches(out, &device.tag, chains);
    }
    let _ = write!(out, "</{}>", device.tag);
}

fn write_branches(out: &mut String, rack_tag: &str, chains: &[ChainSpec]) {
    let (branch, device_chain) = branch_tags(rack_tag);
    out.push_str("<Branches>");
    for (i, chain) in chains.iter().enumerate() {
        let _ = write!(
            out,
            "<{branch} Id=\"{i}\"><Name Value=\"{}\" /><IsSoloed Value=\"false\" />",
            chain.name
        );
        let _ = write!(out, "<DeviceChain><{device_chain}><Devices>");
        for device in &chain.devices {
            write_device(out, device);
        }
        let _ = write!(out, "</Devices></{device_chain}></DeviceChain></{branch}>");
    }
    out.push_str("</Branches>");
}

/// Full document around a rack device. `macros` are `(name, native value)`.
pub fn rack_document(rack: &DeviceSpec, macros: &[(&str, f64)], creator: Option<&str>) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    match creator {
        Some(creator) => {
            let _ = write!(
                out,
                r#"<Ableton MajorVersion="5" MinorVersion="11.0_433" SchemaChangeCount="3" Creator="{}" Revision="5ac24cad7c51ea0671d49e6b4885371f15b57c1e">"#,
                creator
            );
        }
        None => out.push_str("<Ableton>"),
    }
    out.push_str("<GroupDevicePreset><OverwriteProtectionNumber Value=\"2816\" /><Device>");

    let mut rack_xml = String::new();
    write_device(&mut rack_xml, rack);
    // Macros belong to the rack element itself
    let closing = format!("</{}>", rack.tag);
    let mut macro_xml = String::new();
    for (i, (name, value)) in macros.iter().enumerate() {
        let _ = write!(
            macro_xml,
            "<MacroControls.{i}><Manual Value=\"{value}\" /></MacroControls.{i}><MacroDisplayNames.{i} Value=\"{name}\" />"
        );
    }
    if let Some(pos) = rack_xml.rfind(&closing) {
        rack_xml.insert_str(pos, &macro_xml);
    }
    out.push_str(&rack_xml);

    out.push_str("</Device></GroupDevicePreset></Ableton>");
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

pub fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

pub fn write_adg(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
    write_file(dir, name, &gzip(xml.as_bytes()))
}
