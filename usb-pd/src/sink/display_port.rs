//! Canned DisplayPort alternate mode responder.
//!
//! Presents the sink as a DisplayPort adapter: it answers discovery, accepts the mode and
//! reports an attached display. Every answer is the request header turned into an ACK followed
//! by fixed data objects.

use {
    crate::vdo::{
        DisplayPortCapabilities, DisplayPortConfigure, DisplayPortStatus, VdmCommandType,
        VdmHeaderStructured, DISCOVER_IDENTITY, DISCOVER_MODES, DISCOVER_SVIDS, DP_CONFIGURE,
        DP_STATUS_UPDATE, ENTER_MODE, SVID_DISPLAY_PORT,
    },
    byteorder::{ByteOrder, LittleEndian},
};

/// ID header (alternate mode adapter, modal, VID 0x25A4), cert stat, product, UFP VDO
const IDENTITY: [u8; 16] = [
    0xa4, 0x25, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x0b, 0x00, 0x00, 0x11,
];

/// DisplayPort only
const SVIDS: [u8; 4] = [0x00, 0x00, 0x01, 0xff];

/// UFP_D capable, DP 1.3 signaling, pin assignments C and D
const MODES: [u8; 4] = [0x05, 0x0c, 0x00, 0x00];

/// UFP_D connected, enabled, multi-function preferred, HPD high
const STATUS: [u8; 4] = [0x9a, 0x00, 0x00, 0x00];

/// Data objects to answer a structured request with, `None` for requests left unanswered.
pub(super) fn response(request: VdmHeaderStructured) -> Option<&'static [u8]> {
    if request.command_type() != VdmCommandType::InitiatorReq {
        return None;
    }

    match (request.svid(), request.command()) {
        (_, DISCOVER_IDENTITY) => Some(&IDENTITY[..]),
        (_, DISCOVER_SVIDS) => Some(&SVIDS[..]),
        (_, DISCOVER_MODES) => Some(&MODES[..]),
        (_, ENTER_MODE) => Some(&[]),
        (SVID_DISPLAY_PORT, DP_STATUS_UPDATE) => Some(&STATUS[..]),
        (SVID_DISPLAY_PORT, DP_CONFIGURE) => Some(&[]),
        _ => None,
    }
}

/// Logs the DisplayPort objects carried by a message.
pub(super) fn log_objects(header: VdmHeaderStructured, objects: &[[u8; 4]]) {
    if header.svid() != SVID_DISPLAY_PORT {
        return;
    }
    let Some(object) = objects.first().map(|object| LittleEndian::read_u32(object)) else {
        return;
    };

    match (header.command(), header.command_type()) {
        (DISCOVER_MODES, VdmCommandType::ResponderAck) => {
            info!("modes {:?}", DisplayPortCapabilities(object))
        }
        (DP_STATUS_UPDATE, _) => info!("status {:?}", DisplayPortStatus(object)),
        (DP_CONFIGURE, VdmCommandType::InitiatorReq) => {
            info!("configure {:?}", DisplayPortConfigure(object))
        }
        _ => {}
    }
}
