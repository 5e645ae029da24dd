use {
    crate::{DataRole, PowerRole},
    byteorder::{ByteOrder, LittleEndian},
    proc_bitfield::bitfield,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecificationRevision {
    R1_0,
    R2_0,
    R3_0,
    Reserved,
}

impl SpecificationRevision {
    /// Single digit used in message summaries.
    pub fn digit(self) -> char {
        match self {
            Self::R1_0 => '1',
            Self::R2_0 => '2',
            Self::R3_0 => '3',
            Self::Reserved => '?',
        }
    }
}

impl From<u8> for SpecificationRevision {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::R1_0,
            0b01 => Self::R2_0,
            0b10 => Self::R3_0,
            _ => Self::Reserved,
        }
    }
}

impl From<SpecificationRevision> for u8 {
    fn from(value: SpecificationRevision) -> Self {
        match value {
            SpecificationRevision::R1_0 => 0b00,
            SpecificationRevision::R2_0 => 0b01,
            SpecificationRevision::R3_0 => 0b10,
            SpecificationRevision::Reserved => 0b11,
        }
    }
}

bitfield! {
    /// Message header, transmitted low byte first.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Header(pub u16): Debug, FromStorage, IntoStorage {
        pub extended: bool @ 15,
        pub num_objects: u8 @ 12..=14,
        pub message_id: u8 @ 9..=11,
        pub port_power_role: bool [get PowerRole, set PowerRole] @ 8,
        pub spec_revision: u8 [get SpecificationRevision, set SpecificationRevision] @ 6..=7,
        pub port_data_role: bool [get DataRole, set DataRole] @ 5,
        pub message_type_raw: u8 @ 0..=4,
    }
}

impl Header {
    /// Header for an outgoing message of the given type and object count.
    pub fn new(
        message_type: MessageType,
        num_objects: u8,
        message_id: u8,
        revision: SpecificationRevision,
        power_role: PowerRole,
        data_role: DataRole,
    ) -> Self {
        Header(0)
            .with_message_type_raw(message_type.raw())
            .with_num_objects(num_objects)
            .with_message_id(message_id & 0b111)
            .with_spec_revision(revision)
            .with_port_power_role(power_role)
            .with_port_data_role(data_role)
    }

    pub fn from_bytes(buf: [u8; 2]) -> Self {
        Header(LittleEndian::read_u16(&buf))
    }

    pub fn to_bytes(self) -> [u8; 2] {
        let mut buf = [0; 2];
        LittleEndian::write_u16(&mut buf, self.0);
        buf
    }

    /// Zero data objects means a control message.
    pub fn message_type(&self) -> MessageType {
        if self.num_objects() == 0 {
            MessageType::Control(self.message_type_raw().into())
        } else {
            MessageType::Data(self.message_type_raw().into())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    Control(ControlMessageType),
    Data(DataMessageType),
}

impl MessageType {
    pub fn raw(self) -> u8 {
        match self {
            Self::Control(c) => c.into(),
            Self::Data(d) => d.into(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Control(c) => c.name(),
            Self::Data(d) => d.name(),
        }
    }
}

/// Control message names, indexed by the message type field.
pub const CONTROL_MESSAGE_NAMES: [&str; 25] = [
    "Reserved",
    "GoodCRC",
    "GotoMin",
    "Accept",
    "Reject",
    "Ping",
    "PS_RDY",
    "Get_Source_Cap",
    "Get_Sink_Cap",
    "DR_Swap",
    "PR_Swap",
    "VCONN_Swap",
    "Wait",
    "Soft_Reset",
    "Data_Reset",
    "Data_Reset_Complete",
    "Not_Supported",
    "Get_Source_Cap_Extended",
    "Get_Status",
    "FR_Swap",
    "Get_PPS_Status",
    "Get_Country_Codes",
    "Get_Sink_Cap_Extended",
    "Get_Source_Info",
    "Get_Revision",
];

/// Data message names, indexed by the low four bits of the message type field.
pub const DATA_MESSAGE_NAMES: [&str; 16] = [
    "Reserved",
    "Source_Capabilities",
    "Request",
    "BIST",
    "Sink_Capabilities",
    "Battery_Status",
    "Alert",
    "Get_Country_Info",
    "Enter_USB",
    "EPR_Request",
    "EPR_Mode",
    "Source_Info",
    "Revision",
    "Reserved",
    "Reserved",
    "Vendor_Defined",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMessageType {
    GoodCRC,
    GotoMin,
    Accept,
    Reject,
    Ping,
    PsRdy,
    GetSourceCap,
    GetSinkCap,
    DrSwap,
    PrSwap,
    VconnSwap,
    Wait,
    SoftReset,
    DataReset,
    DataResetComplete,
    NotSupported,
    GetSourceCapExtended,
    GetStatus,
    FrSwap,
    GetPpsStatus,
    GetCountryCodes,
    GetSinkCapExtended,
    GetSourceInfo,
    GetRevision,
    Reserved(u8),
}

impl ControlMessageType {
    pub fn name(self) -> &'static str {
        CONTROL_MESSAGE_NAMES
            .get(u8::from(self) as usize)
            .copied()
            .unwrap_or("Reserved")
    }
}

impl From<u8> for ControlMessageType {
    fn from(value: u8) -> Self {
        match value {
            0b0_0001 => Self::GoodCRC,
            0b0_0010 => Self::GotoMin,
            0b0_0011 => Self::Accept,
            0b0_0100 => Self::Reject,
            0b0_0101 => Self::Ping,
            0b0_0110 => Self::PsRdy,
            0b0_0111 => Self::GetSourceCap,
            0b0_1000 => Self::GetSinkCap,
            0b0_1001 => Self::DrSwap,
            0b0_1010 => Self::PrSwap,
            0b0_1011 => Self::VconnSwap,
            0b0_1100 => Self::Wait,
            0b0_1101 => Self::SoftReset,
            0b0_1110 => Self::DataReset,
            0b0_1111 => Self::DataResetComplete,
            0b1_0000 => Self::NotSupported,
            0b1_0001 => Self::GetSourceCapExtended,
            0b1_0010 => Self::GetStatus,
            0b1_0011 => Self::FrSwap,
            0b1_0100 => Self::GetPpsStatus,
            0b1_0101 => Self::GetCountryCodes,
            0b1_0110 => Self::GetSinkCapExtended,
            0b1_0111 => Self::GetSourceInfo,
            0b1_1000 => Self::GetRevision,
            other => Self::Reserved(other & 0b1_1111),
        }
    }
}

impl From<ControlMessageType> for u8 {
    fn from(value: ControlMessageType) -> Self {
        use ControlMessageType::*;
        match value {
            GoodCRC => 0b0_0001,
            GotoMin => 0b0_0010,
            Accept => 0b0_0011,
            Reject => 0b0_0100,
            Ping => 0b0_0101,
            PsRdy => 0b0_0110,
            GetSourceCap => 0b0_0111,
            GetSinkCap => 0b0_1000,
            DrSwap => 0b0_1001,
            PrSwap => 0b0_1010,
            VconnSwap => 0b0_1011,
            Wait => 0b0_1100,
            SoftReset => 0b0_1101,
            DataReset => 0b0_1110,
            DataResetComplete => 0b0_1111,
            NotSupported => 0b1_0000,
            GetSourceCapExtended => 0b1_0001,
            GetStatus => 0b1_0010,
            FrSwap => 0b1_0011,
            GetPpsStatus => 0b1_0100,
            GetCountryCodes => 0b1_0101,
            GetSinkCapExtended => 0b1_0110,
            GetSourceInfo => 0b1_0111,
            GetRevision => 0b1_1000,
            Reserved(raw) => raw,
        }
    }
}

/// Data message types. The table has 16 entries; the fifth type bit does not take part in the
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMessageType {
    SourceCapabilities,
    Request,
    Bist,
    SinkCapabilities,
    BatteryStatus,
    Alert,
    GetCountryInfo,
    EnterUsb,
    EprRequest,
    EprMode,
    SourceInfo,
    Revision,
    VendorDefined,
    Reserved(u8),
}

impl DataMessageType {
    pub fn name(self) -> &'static str {
        DATA_MESSAGE_NAMES[(u8::from(self) & 0b1111) as usize]
    }
}

impl From<u8> for DataMessageType {
    fn from(value: u8) -> Self {
        match value & 0b1111 {
            0b0001 => Self::SourceCapabilities,
            0b0010 => Self::Request,
            0b0011 => Self::Bist,
            0b0100 => Self::SinkCapabilities,
            0b0101 => Self::BatteryStatus,
            0b0110 => Self::Alert,
            0b0111 => Self::GetCountryInfo,
            0b1000 => Self::EnterUsb,
            0b1001 => Self::EprRequest,
            0b1010 => Self::EprMode,
            0b1011 => Self::SourceInfo,
            0b1100 => Self::Revision,
            0b1111 => Self::VendorDefined,
            other => Self::Reserved(other),
        }
    }
}

impl From<DataMessageType> for u8 {
    fn from(value: DataMessageType) -> Self {
        use DataMessageType::*;
        match value {
            SourceCapabilities => 0b0001,
            Request => 0b0010,
            Bist => 0b0011,
            SinkCapabilities => 0b0100,
            BatteryStatus => 0b0101,
            Alert => 0b0110,
            GetCountryInfo => 0b0111,
            EnterUsb => 0b1000,
            EprRequest => 0b1001,
            EprMode => 0b1010,
            SourceInfo => 0b1011,
            Revision => 0b1100,
            VendorDefined => 0b1111,
            Reserved(raw) => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_capabilities_header() {
        // wire order: type/role/revision byte first, then count/id/power role
        let header = Header::from_bytes([0x91, 0x2C]);

        assert_eq!(header.num_objects(), 2);
        assert_eq!(header.message_id(), 6);
        assert_eq!(header.message_type_raw(), 0x11);
        assert_eq!(header.spec_revision(), SpecificationRevision::R3_0);
        assert_eq!(header.port_power_role(), PowerRole::Sink);
        assert_eq!(header.port_data_role(), DataRole::Ufp);
        assert!(!header.extended());
        assert_eq!(
            header.message_type(),
            MessageType::Data(DataMessageType::SourceCapabilities)
        );
        assert_eq!(header.message_type().name(), "Source_Capabilities");
    }

    #[test]
    fn zero_objects_is_control() {
        let header = Header::from_bytes([0x46, 0x03]);

        assert_eq!(
            header.message_type(),
            MessageType::Control(ControlMessageType::PsRdy)
        );
        assert_eq!(header.message_id(), 1);
        assert_eq!(header.port_power_role(), PowerRole::Source);
    }

    #[test]
    fn builds_source_header() {
        let header = Header::new(
            MessageType::Control(ControlMessageType::Accept),
            0,
            2,
            SpecificationRevision::R3_0,
            PowerRole::Source,
            DataRole::Dfp,
        );

        assert_eq!(header.to_bytes(), [0b1010_0011, 0b0000_0101]);
    }

    #[test]
    fn name_tables_follow_type_values() {
        assert_eq!(CONTROL_MESSAGE_NAMES.len(), 25);
        assert_eq!(DATA_MESSAGE_NAMES.len(), 16);

        for raw in 1..=0x18u8 {
            let kind = ControlMessageType::from(raw);
            assert_eq!(u8::from(kind), raw);
            assert_eq!(kind.name(), CONTROL_MESSAGE_NAMES[raw as usize]);
        }

        assert_eq!(ControlMessageType::from(0x1f).name(), "Reserved");
        assert_eq!(DataMessageType::from(0x0f).name(), "Vendor_Defined");
        assert_eq!(DataMessageType::from(0x02).name(), "Request");
        assert_eq!(DataMessageType::from(0x0d), DataMessageType::Reserved(0x0d));
    }
}
