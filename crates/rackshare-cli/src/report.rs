//! Output rendering for analyzed racks.

use clap::ValueEnum;
use rackshare_adg::{classify_analysis, Chain, Device, RackAnalysis};
use std::fmt::Write as _;

/// Output format of `rackshare analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per file
    #[default]
    Json,
    /// Indented device tree
    Text,
}

/// Render `analysis` in the requested format.
pub fn render(analysis: &RackAnalysis, format: OutputFormat, pretty: bool) -> rackshare_adg::Result<String> {
    match format {
        OutputFormat::Json if pretty => analysis.to_json_pretty(),
        OutputFormat::Json => analysis.to_json(),
        OutputFormat::Text => Ok(render_text(analysis)),
    }
}

/// Human-readable tree of the rack.
///
/// ```text
/// Bass Mangler [Audio Effect Rack]
///   Live 11.3.4, requires standard
///   Macros: Drive=0.50, Tone=1.00
///   Chain "Dry"
///     EQ Eight
///     Squash (Compressor) [off]
/// ```
pub fn render_text(analysis: &RackAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", analysis.name, analysis.rack_type.display_name());
    let _ = writeln!(
        out,
        "  Live {}, requires {}",
        analysis.version_info.version, analysis.required_edition
    );
    let _ = writeln!(
        out,
        "  {} chains, {} devices, nesting depth {}",
        analysis.summary.chain_count,
        analysis.summary.device_count,
        analysis.summary.max_nesting_depth
    );

    if !analysis.macro_controls.is_empty() {
        let macros: Vec<String> = analysis
            .macro_controls
            .iter()
            .map(|m| format!("{}={:.2}", m.name, m.value))
            .collect();
        let _ = writeln!(out, "  Macros: {}", macros.join(", "));
    }

    write_chains(&mut out, &analysis.chains, 1);

    for error in &analysis.parsing_errors {
        let _ = writeln!(out, "  error: {}", error);
    }
    for warning in &analysis.parsing_warnings {
        let _ = writeln!(out, "  warning: {}", warning);
    }
    out
}

fn write_chains(out: &mut String, chains: &[Chain], level: usize) {
    let indent = "  ".repeat(level);
    for chain in chains {
        let _ = write!(out, "{}Chain \"{}\"", indent, chain.name);
        if let Some(pad) = &chain.drum_pad {
            let _ = write!(out, " pad {}", pad.note_name);
        }
        if chain.is_soloed {
            out.push_str(" [solo]");
        }
        out.push('\n');
        for device in &chain.devices {
            write_device(out, device, level + 1);
        }
    }
}

fn write_device(out: &mut String, device: &Device, level: usize) {
    let _ = write!(out, "{}{}", "  ".repeat(level), device.name);
    if device.name != device.standard_name {
        let _ = write!(out, " ({})", device.standard_name);
    }
    if let Some(preset) = &device.preset_name {
        let _ = write!(out, " <{}>", preset);
    }
    if !device.is_on {
        out.push_str(" [off]");
    }
    out.push('\n');
    if let Some(chains) = &device.chains {
        write_chains(out, chains, level + 1);
    }
}

/// One line of `rackshare edition` output, with the devices that decided it.
///
/// ```text
/// bass.adg: suite (suite: Wavetable; standard: EQ Eight)
/// ```
pub fn edition_line(label: &str, analysis: &RackAnalysis) -> String {
    let report = classify_analysis(analysis);
    let mut deciding = Vec::new();
    if !report.suite_devices.is_empty() {
        deciding.push(format!("suite: {}", report.suite_devices.join(", ")));
    }
    if !report.standard_devices.is_empty() {
        deciding.push(format!("standard: {}", report.standard_devices.join(", ")));
    }

    if deciding.is_empty() {
        format!("{}: {}", label, report.edition)
    } else {
        format!("{}: {} ({})", label, report.edition, deciding.join("; "))
    }
}
