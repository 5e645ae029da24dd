use {
    crate::{
        header::{ControlMessageType, DataMessageType, Header, MessageType},
        pdo::{parse_pdo, PowerDataObject, RawRequestDataObject},
        vdo::VdmHeader,
        DataRole, PowerRole,
    },
    byteorder::{ByteOrder, LittleEndian},
    core::fmt,
    heapless::Vec,
};

/// Data objects a single message can carry.
pub const MAX_OBJECTS: usize = 7;

/// Start-of-packet kind a frame was received with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartOfPacket {
    /// SOP, port partner
    Primary,
    /// SOP', cable plug
    Prime,
}

impl StartOfPacket {
    /// FIFO token preceding a received frame
    pub fn from_token(token: u8) -> Option<Self> {
        match token {
            0xe0 => Some(Self::Primary),
            0xc0 => Some(Self::Prime),
            _ => None,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Primary => "",
            Self::Prime => "'",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub header: Header,
    pub sop: StartOfPacket,
    pub objects: Vec<[u8; 4], MAX_OBJECTS>,
    /// Present on Vendor_Defined messages
    pub vdm: Option<VdmHeader>,
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        self.header.message_type()
    }

    pub fn is_control(&self, message_type: ControlMessageType) -> bool {
        self.message_type() == MessageType::Control(message_type)
    }

    pub fn is_data(&self, message_type: DataMessageType) -> bool {
        self.message_type() == MessageType::Data(message_type)
    }

    /// Every data object decoded as a power data object.
    pub fn pdos(&self) -> impl Iterator<Item = PowerDataObject> + '_ {
        self.objects.iter().map(|object| parse_pdo(*object))
    }

    /// First data object of a Request message.
    pub fn request_object(&self) -> Option<RawRequestDataObject> {
        self.objects
            .first()
            .map(|object| RawRequestDataObject(LittleEndian::read_u32(object)))
    }

    /// Data objects following the VDM header.
    pub fn vdm_objects(&self) -> &[[u8; 4]] {
        match self.vdm {
            Some(_) => self.objects.get(1..).unwrap_or(&[]),
            None => &[],
        }
    }

    /// One-line summary, `outgoing` selects the direction marker.
    pub fn summary(&self, outgoing: bool) -> Summary<'_> {
        Summary {
            message: self,
            outgoing,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.summary(false), f)
    }
}

/// Diagnostic summary of a message, the same layout capture tooling prints:
///
/// `< 6: Source_Capabilities; pC dD r3, std, p5, A151 0801912C ...`
///
/// The header is shown as its two bytes in wire order, low byte first, so `A151` is the 16 bit
/// value 0x51a1. Data objects are shown as 32 bit values, most significant digit first.
pub struct Summary<'a> {
    message: &'a Message,
    outgoing: bool,
}

impl Summary<'_> {
    fn direction(&self) -> char {
        if self.outgoing {
            '>'
        } else {
            '<'
        }
    }

    fn roles(&self) -> (char, char) {
        let header = self.message.header;
        match self.message.sop {
            StartOfPacket::Primary => (
                match header.port_power_role() {
                    PowerRole::Sink => 'N',
                    PowerRole::Source => 'C',
                },
                match header.port_data_role() {
                    DataRole::Ufp => 'U',
                    DataRole::Dfp => 'D',
                },
            ),
            StartOfPacket::Prime => ('R', 'R'),
        }
    }

    fn extended(&self) -> &'static str {
        if self.message.header.extended() {
            "ext"
        } else {
            "std"
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.message.header;
        let (power, data) = self.roles();
        let [low, high] = header.to_bytes();
        write!(
            f,
            "{} {}{}: {}; p{} d{} r{}, {}, p{}, {:02X}{:02X}",
            self.direction(),
            header.message_id(),
            self.message.sop.marker(),
            header.message_type().name(),
            power,
            data,
            header.spec_revision().digit(),
            self.extended(),
            header.num_objects(),
            low,
            high,
        )?;
        for object in self.message.objects.iter() {
            write!(f, " {:08X}", LittleEndian::read_u32(object))?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Summary<'_> {
    fn format(&self, f: defmt::Formatter) {
        let header = self.message.header;
        let (power, data) = self.roles();
        let [low, high] = header.to_bytes();
        defmt::write!(
            f,
            "{} {}{}: {}; p{} d{} r{}, {}, p{}, {:#x} {:#x}",
            self.direction(),
            header.message_id(),
            self.message.sop.marker(),
            header.message_type().name(),
            power,
            data,
            header.spec_revision().digit(),
            self.extended(),
            header.num_objects(),
            low,
            high,
        );
        for object in self.message.objects.iter() {
            defmt::write!(f, " {:#x}", LittleEndian::read_u32(object));
        }
    }
}
