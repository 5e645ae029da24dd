use {
    crate::error::CodecError,
    byteorder::{ByteOrder, LittleEndian},
    heapless::Vec,
    proc_bitfield::bitfield,
};

/// Standard ID
pub const SVID_SID: u16 = 0xff00;
/// VESA DisplayPort
pub const SVID_DISPLAY_PORT: u16 = 0xff01;

/// Default structured VDM version field, 2.0
pub const VDM_VERSION: u8 = 0b0100;

pub const DISCOVER_IDENTITY: u8 = 0x01;
pub const DISCOVER_SVIDS: u8 = 0x02;
pub const DISCOVER_MODES: u8 = 0x03;
pub const ENTER_MODE: u8 = 0x04;
pub const EXIT_MODE: u8 = 0x05;
pub const ATTENTION: u8 = 0x06;
pub const DP_STATUS_UPDATE: u8 = 0x10;
pub const DP_CONFIGURE: u8 = 0x11;

const COMMAND_NAMES: [&str; 7] = [
    "Reserved",
    "Discover Identity",
    "Discover SVIDs",
    "Discover Modes",
    "Enter Mode",
    "Exit Mode",
    "Attention",
];

/// Name of a structured VDM command. Commands 16 and up are SVID specific.
pub fn command_name(svid: u16, command: u8) -> &'static str {
    match (svid, command) {
        (_, command) if usize::from(command) < COMMAND_NAMES.len() => {
            COMMAND_NAMES[usize::from(command)]
        }
        (_, 7..=15) => "Reserved",
        (SVID_DISPLAY_PORT, DP_STATUS_UPDATE) => "DP Status Update",
        (SVID_DISPLAY_PORT, DP_CONFIGURE) => "DP Configure",
        _ => "SVID specific",
    }
}

pub fn svid_name(svid: u16) -> &'static str {
    match svid {
        SVID_SID => "SID",
        SVID_DISPLAY_PORT => "DisplayPort",
        _ => "Unknown",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VdmCommandType {
    InitiatorReq,
    ResponderAck,
    ResponderNak,
    ResponderBusy,
}

impl VdmCommandType {
    pub fn name(self) -> &'static str {
        match self {
            Self::InitiatorReq => "REQ",
            Self::ResponderAck => "ACK",
            Self::ResponderNak => "NAK",
            Self::ResponderBusy => "BUSY",
        }
    }
}

impl From<u8> for VdmCommandType {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => Self::InitiatorReq,
            1 => Self::ResponderAck,
            2 => Self::ResponderNak,
            _ => Self::ResponderBusy,
        }
    }
}

impl From<VdmCommandType> for u8 {
    fn from(value: VdmCommandType) -> Self {
        match value {
            VdmCommandType::InitiatorReq => 0,
            VdmCommandType::ResponderAck => 1,
            VdmCommandType::ResponderNak => 2,
            VdmCommandType::ResponderBusy => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VdmHeader {
    Structured(VdmHeaderStructured),
    Unstructured(VdmHeaderUnstructured),
}

impl VdmHeader {
    pub fn svid(&self) -> u16 {
        match self {
            Self::Structured(header) => header.svid(),
            Self::Unstructured(header) => header.svid(),
        }
    }

    pub fn structured(&self) -> Option<VdmHeaderStructured> {
        match self {
            Self::Structured(header) => Some(*header),
            Self::Unstructured(_) => None,
        }
    }
}

impl From<u32> for VdmHeader {
    fn from(value: u32) -> Self {
        if VdmHeaderRaw(value).structured() {
            VdmHeader::Structured(VdmHeaderStructured(value))
        } else {
            VdmHeader::Unstructured(VdmHeaderUnstructured(value))
        }
    }
}

impl From<VdmHeader> for u32 {
    fn from(value: VdmHeader) -> Self {
        match value {
            VdmHeader::Structured(header) => header.0,
            VdmHeader::Unstructured(header) => header.0,
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct VdmHeaderRaw(pub u32): Debug, FromStorage, IntoStorage {
        /// Standard or Vendor ID
        pub svid: u16 @ 16..=31,
        pub structured: bool @ 15,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VdmHeaderStructured(pub u32): Debug, FromStorage, IntoStorage {
        /// Standard or Vendor ID
        pub svid: u16 @ 16..=31,
        pub structured: bool @ 15,
        /// Structured VDM version, major in the upper two bits
        pub version: u8 @ 11..=14,
        pub object_position: u8 @ 8..=10,
        pub command_type: u8 [get VdmCommandType, set VdmCommandType] @ 6..=7,
        pub command: u8 @ 0..=4,
    }
}

impl VdmHeaderStructured {
    pub fn new(svid: u16, command: u8, command_type: VdmCommandType, object_position: u8) -> Self {
        VdmHeaderStructured(0)
            .with_svid(svid)
            .with_structured(true)
            .with_version(VDM_VERSION)
            .with_object_position(object_position & 0b111)
            .with_command_type(command_type)
            .with_command(command & 0b1_1111)
    }

    pub fn command_name(&self) -> &'static str {
        command_name(self.svid(), self.command())
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VdmHeaderUnstructured(pub u32): Debug, FromStorage, IntoStorage {
        /// Standard or Vendor ID
        pub svid: u16 @ 16..=31,
        pub structured: bool @ 15,
        /// Message defined
        pub data: u16 @ 0..=14,
    }
}

pub fn parse_vdm_header(bytes: [u8; 4]) -> VdmHeader {
    LittleEndian::read_u32(&bytes).into()
}

/// Header followed by `extra` as the payload of a Vendor_Defined message.
pub fn build_vdm_header(header: VdmHeader, extra: &[u8]) -> Result<Vec<u8, 28>, CodecError> {
    let VdmHeader::Structured(header) = header else {
        return Err(CodecError::UnstructuredVdm);
    };
    if extra.len() % 4 != 0 {
        return Err(CodecError::PayloadLength(extra.len()));
    }

    let mut payload = Vec::new();
    let mut buf = [0; 4];
    LittleEndian::write_u32(&mut buf, header.0);
    payload
        .extend_from_slice(&buf)
        .and_then(|_| payload.extend_from_slice(extra))
        .map_err(|_| CodecError::TooManyObjects(1 + extra.len() / 4))?;
    Ok(payload)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProductTypeUfp {
    NotUfp,
    PdUsbHub,
    PdUsbPeripheral,
    Psd,
    AlternateModeAdapter,
    Reserved(u8),
}

impl From<u8> for ProductTypeUfp {
    fn from(value: u8) -> Self {
        match value & 0b111 {
            0b000 => Self::NotUfp,
            0b001 => Self::PdUsbHub,
            0b010 => Self::PdUsbPeripheral,
            0b011 => Self::Psd,
            0b101 => Self::AlternateModeAdapter,
            other => Self::Reserved(other),
        }
    }
}

impl From<ProductTypeUfp> for u8 {
    fn from(value: ProductTypeUfp) -> Self {
        match value {
            ProductTypeUfp::NotUfp => 0b000,
            ProductTypeUfp::PdUsbHub => 0b001,
            ProductTypeUfp::PdUsbPeripheral => 0b010,
            ProductTypeUfp::Psd => 0b011,
            ProductTypeUfp::AlternateModeAdapter => 0b101,
            ProductTypeUfp::Reserved(raw) => raw,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProductTypeDfp {
    NotDfp,
    PdUsbHub,
    PdUsbHost,
    PowerBrick,
    Reserved(u8),
}

impl From<u8> for ProductTypeDfp {
    fn from(value: u8) -> Self {
        match value & 0b111 {
            0b000 => Self::NotDfp,
            0b001 => Self::PdUsbHub,
            0b010 => Self::PdUsbHost,
            0b011 => Self::PowerBrick,
            other => Self::Reserved(other),
        }
    }
}

impl From<ProductTypeDfp> for u8 {
    fn from(value: ProductTypeDfp) -> Self {
        match value {
            ProductTypeDfp::NotDfp => 0b000,
            ProductTypeDfp::PdUsbHub => 0b001,
            ProductTypeDfp::PdUsbHost => 0b010,
            ProductTypeDfp::PowerBrick => 0b011,
            ProductTypeDfp::Reserved(raw) => raw,
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct IdentityHeader(pub u32): Debug, FromStorage, IntoStorage {
        /// Host data capable
        pub host_data: bool @ 31,
        /// Device data capable
        pub device_data: bool @ 30,
        pub product_type_ufp: u8 [get ProductTypeUfp, set ProductTypeUfp] @ 27..=29,
        /// Modal operation supported
        pub modal_supported: bool @ 26,
        pub product_type_dfp: u8 [get ProductTypeDfp, set ProductTypeDfp] @ 23..=25,
        pub connector_type: u8 @ 21..=22,
        /// USB vendor ID
        pub vid: u16 @ 0..=15,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ProductVdo(pub u32): Debug, FromStorage, IntoStorage {
        /// USB product ID
        pub pid: u16 @ 16..=31,
        pub bcd_device: u16 @ 0..=15,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortCapabilities(pub u32): Debug, FromStorage, IntoStorage {
        pub ufp_d_pin_assignments: u8 @ 16..=23,
        pub dfp_d_pin_assignments: u8 @ 8..=15,
        pub usb20_signaling_not_used: bool @ 7,
        pub receptacle: bool @ 6,
        /// Bit 0 is DP 1.3, bit 1 is USB Gen 2
        pub signaling: u8 @ 2..=5,
        /// 1 UFP_D, 2 DFP_D, 3 both
        pub port_capability: u8 @ 0..=1,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortStatus(pub u32): Debug, FromStorage, IntoStorage {
        pub irq_hpd: bool @ 8,
        pub hpd_state: bool @ 7,
        pub exit_mode_request: bool @ 6,
        pub usb_configuration_request: bool @ 5,
        pub multi_function_preferred: bool @ 4,
        pub enabled: bool @ 3,
        pub power_low: bool @ 2,
        /// 1 DFP_D connected, 2 UFP_D connected, 3 both
        pub connected: u8 @ 0..=1,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortConfigure(pub u32): Debug, FromStorage, IntoStorage {
        /// One bit per pin assignment, A at bit 0
        pub pin_assignment: u8 @ 8..=15,
        pub signaling: u8 @ 2..=5,
        /// 0 USB, 1 UFP_U as DFP_D, 2 UFP_U as UFP_D
        pub select_configuration: u8 @ 0..=1,
    }
}
