//! Rack macro knobs.

use super::document::{child, number_of, text_of, value_of};
use crate::diagnostics::Diagnostics;
use crate::types::MacroControl;
use roxmltree::Node;

/// Number of macro slots a rack can have.
pub const MAX_MACROS: usize = 16;

/// Macro count of racks saved before the count became configurable.
pub const CLASSIC_MACRO_COUNT: usize = 8;

/// Map a native knob value onto 0.0..=1.0.
///
/// Non-finite values become 0.0; everything else is scaled by `native_max`
/// and clamped.
pub fn normalize_macro_value(raw: f64, native_max: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    (raw / native_max).clamp(0.0, 1.0)
}

/// Read the macros of the rack device `anchor`.
///
/// Only the rack's own macros are read; nested racks keep theirs private.
pub fn extract_macro_controls(
    anchor: Node<'_, '_>,
    native_max: f64,
    rack_label: &str,
    diags: &mut Diagnostics,
) -> Vec<MacroControl> {
    let visible = match number_of(anchor, "NumVisibleMacroControls") {
        None => CLASSIC_MACRO_COUNT,
        Some(n) if n >= 1.0 && n <= MAX_MACROS as f64 => n as usize,
        Some(n) => {
            diags.warn(format!(
                "{}: NumVisibleMacroControls value {} is out of range, using {}",
                rack_label, n, MAX_MACROS
            ));
            MAX_MACROS
        }
    };

    let mut macros = Vec::with_capacity(visible);
    for index in 0..visible {
        let Some(control) = child(anchor, &format!("MacroControls.{}", index)) else {
            continue;
        };

        let name = match value_of(anchor, &format!("MacroDisplayNames.{}", index)) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            Some(_) => default_macro_name(index),
            None => {
                diags.warn(format!(
                    "{}: macro {} has no display name, using default",
                    rack_label,
                    index + 1
                ));
                default_macro_name(index)
            }
        };

        let raw = match text_of(control, "Manual").map(|v| v.parse::<f64>()) {
            Some(Ok(raw)) => raw,
            Some(Err(_)) | None => {
                diags.warn(format!(
                    "{}: macro {} ('{}') has no readable value, assuming 0",
                    rack_label,
                    index + 1,
                    name
                ));
                0.0
            }
        };

        if !raw.is_finite() || raw < 0.0 || raw > native_max {
            diags.warn(format!(
                "{}: macro {} ('{}') value {} is outside 0..={}, clamped",
                rack_label,
                index + 1,
                name,
                raw,
                native_max
            ));
        }

        macros.push(MacroControl {
            index: index as u8,
            name,
            value: normalize_macro_value(raw, native_max),
        });
    }

    macros
}

fn default_macro_name(index: usize) -> String {
    format!("Macro {}", index + 1)
}
