//! Root device-group classification.

use super::document::{element_children, path, RackDocument};
use crate::catalog::is_group_tag;
use crate::types::RackType;
use roxmltree::Node;

/// What kind of rack a document holds and where its device element is.
#[derive(Debug, Clone, Copy)]
pub struct RackTypeInfo<'a, 'input> {
    /// Classified rack kind
    pub rack_type: RackType,
    /// The element of the rack device itself, if one was found
    pub anchor: Option<Node<'a, 'input>>,
}

impl<'a, 'input> RackTypeInfo<'a, 'input> {
    /// Element tag of the anchor device.
    pub fn anchor_tag(&self) -> Option<&'a str> {
        self.anchor.map(|n| n.tag_name().name())
    }
}

/// Classify the rack and locate its anchor device.
///
/// A preset is laid out as `Ableton > GroupDevicePreset > Device > <XGroupDevice>`.
/// Older or hand-edited files sometimes drop the wrapper elements, so the
/// search falls back to the first device-group element anywhere in the
/// document. This never fails: anything unrecognized is
/// [`RackType::Unknown`].
pub fn detect_rack_type<'a, 'input>(doc: &'a RackDocument<'input>) -> RackTypeInfo<'a, 'input> {
    let root = doc.root();

    let preset_device = path(root, &["GroupDevicePreset", "Device"])
        .and_then(|device| element_children(device).next());

    let anchor = preset_device
        .or_else(|| Some(root).filter(|n| is_group_tag(n.tag_name().name())))
        .or_else(|| {
            root.descendants()
                .find(|n| n.is_element() && is_group_tag(n.tag_name().name()))
        });

    let rack_type = anchor
        .and_then(|n| RackType::from_tag(n.tag_name().name()))
        .unwrap_or(RackType::Unknown);

    log::debug!(
        "Detected rack type {} (anchor element: {})",
        rack_type,
        anchor.map(|n| n.tag_name().name()).unwrap_or("<none>")
    );

    RackTypeInfo { rack_type, anchor }
}
