//! Known Live device elements.
//!
//! The document names devices by their internal element tag (`Eq8`,
//! `InstrumentVector`, `StereoGain`, ...). This table maps those tags to the
//! names users see in Live's browser and to a [`DeviceCategory`].

use crate::types::{DeviceCategory, RackType};

/// Catalog entry for one device element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Element tag in the document
    pub tag: &'static str,
    /// Browser name of the device
    pub standard_name: &'static str,
    /// Device family
    pub category: DeviceCategory,
}

use DeviceCategory::{AudioEffect, Instrument, MaxForLive, MidiEffect, Plugin, Rack};

const fn entry(tag: &'static str, standard_name: &'static str, category: DeviceCategory) -> DeviceInfo {
    DeviceInfo {
        tag,
        standard_name,
        category,
    }
}

/// All device tags the analyzer recognizes.
pub const DEVICES: &[DeviceInfo] = &[
    // Racks
    entry("AudioEffectGroupDevice", "Audio Effect Rack", Rack),
    entry("InstrumentGroupDevice", "Instrument Rack", Rack),
    entry("MidiEffectGroupDevice", "MIDI Effect Rack", Rack),
    entry("DrumGroupDevice", "Drum Rack", Rack),
    // Instruments
    entry("Drift", "Drift", Instrument),
    entry("OriginalSimpler", "Simpler", Instrument),
    entry("MultiSampler", "Sampler", Instrument),
    entry("InstrumentImpulse", "Impulse", Instrument),
    entry("Operator", "Operator", Instrument),
    entry("UltraAnalog", "Analog", Instrument),
    entry("LoungeLizard", "Electric", Instrument),
    entry("StringStudio", "Tension", Instrument),
    entry("Collision", "Collision", Instrument),
    entry("InstrumentVector", "Wavetable", Instrument),
    entry("InstrumentMeld", "Meld", Instrument),
    entry("DrumCell", "Drum Sampler", Instrument),
    entry("ProxyInstrumentDevice", "External Instrument", Instrument),
    // Audio effects
    entry("AutoFilter", "Auto Filter", AudioEffect),
    entry("AutoFilter2", "Auto Filter", AudioEffect),
    entry("AutoPan", "Auto Pan", AudioEffect),
    entry("AutoPan2", "Auto Pan", AudioEffect),
    entry("AutoShift", "Auto Shift", AudioEffect),
    entry("BeatRepeat", "Beat Repeat", AudioEffect),
    entry("ChannelEq", "Channel EQ", AudioEffect),
    entry("Chorus", "Chorus", AudioEffect),
    entry("Chorus2", "Chorus-Ensemble", AudioEffect),
    entry("Compressor", "Compressor", AudioEffect),
    entry("Compressor2", "Compressor", AudioEffect),
    entry("Delay", "Delay", AudioEffect),
    entry("SimpleDelay", "Simple Delay", AudioEffect),
    entry("PingPongDelay", "Ping Pong Delay", AudioEffect),
    entry("FilterDelay", "Filter Delay", AudioEffect),
    entry("GrainDelay", "Grain Delay", AudioEffect),
    entry("DrumBuss", "Drum Buss", AudioEffect),
    entry("Eq8", "EQ Eight", AudioEffect),
    entry("FilterEQ3", "EQ Three", AudioEffect),
    entry("Erosion", "Erosion", AudioEffect),
    entry("Gate", "Gate", AudioEffect),
    entry("GlueCompressor", "Glue Compressor", AudioEffect),
    entry("Limiter", "Limiter", AudioEffect),
    entry("Looper", "Looper", AudioEffect),
    entry("Phaser", "Phaser", AudioEffect),
    entry("Flanger", "Flanger", AudioEffect),
    entry("PhaserNew", "Phaser-Flanger", AudioEffect),
    entry("Redux", "Redux", AudioEffect),
    entry("Redux2", "Redux", AudioEffect),
    entry("Reverb", "Reverb", AudioEffect),
    entry("Saturator", "Saturator", AudioEffect),
    entry("StereoGain", "Utility", AudioEffect),
    entry("Tuner", "Tuner", AudioEffect),
    entry("SpectrumAnalyzer", "Spectrum", AudioEffect),
    entry("Tube", "Dynamic Tube", AudioEffect),
    entry("Echo", "Echo", AudioEffect),
    entry("MultibandDynamics", "Multiband Dynamics", AudioEffect),
    entry("Overdrive", "Overdrive", AudioEffect),
    entry("Pedal", "Pedal", AudioEffect),
    entry("Resonator", "Resonators", AudioEffect),
    entry("Vinyl", "Vinyl Distortion", AudioEffect),
    entry("Vocoder", "Vocoder", AudioEffect),
    entry("FrequencyShifter", "Frequency Shifter", AudioEffect),
    entry("Shifter", "Shifter", AudioEffect),
    entry("ProxyAudioEffectDevice", "External Audio Effect", AudioEffect),
    entry("Amp", "Amp", AudioEffect),
    entry("Cabinet", "Cabinet", AudioEffect),
    entry("Corpus", "Corpus", AudioEffect),
    entry("Hybrid", "Hybrid Reverb", AudioEffect),
    entry("Roar", "Roar", AudioEffect),
    entry("Transmute", "Spectral Resonator", AudioEffect),
    entry("SpectralTime", "Spectral Time", AudioEffect),
    // MIDI effects
    entry("MidiArpeggiator", "Arpeggiator", MidiEffect),
    entry("MidiChord", "Chord", MidiEffect),
    entry("MidiNoteLength", "Note Length", MidiEffect),
    entry("MidiPitcher", "Pitch", MidiEffect),
    entry("MidiRandom", "Random", MidiEffect),
    entry("MidiScale", "Scale", MidiEffect),
    entry("MidiVelocity", "Velocity", MidiEffect),
    // Plugins
    entry("PluginDevice", "Plugin", Plugin),
    entry("AuPluginDevice", "Audio Unit Plugin", Plugin),
    // Max for Live
    entry("MxDeviceAudioEffect", "Max Audio Effect", MaxForLive),
    entry("MxDeviceInstrument", "Max Instrument", MaxForLive),
    entry("MxDeviceMidiEffect", "Max MIDI Effect", MaxForLive),
];

/// Look up a device element tag.
pub fn lookup(tag: &str) -> Option<&'static DeviceInfo> {
    DEVICES.iter().find(|info| info.tag == tag)
}

/// Whether `tag` names a device group (rack), including unknown future ones.
pub fn is_group_tag(tag: &str) -> bool {
    RackType::from_tag(tag).is_some()
}

/// Readable fallback name for an unknown tag: `SpectralBlur` -> `Spectral Blur`.
pub fn humanize_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len() + 4);
    let mut prev: Option<char> = None;
    for ch in tag.chars() {
        if let Some(p) = prev {
            let boundary = (ch.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()))
                || (ch.is_ascii_digit() && p.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}
