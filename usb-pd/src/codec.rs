//! Frame scanning and command encoding.
//!
//! Received frames arrive in the transceiver FIFO as a start-of-packet token, two header bytes,
//! the data objects and four CRC bytes. Outgoing commands are the header bytes followed by the
//! data objects; the transceiver adds framing and CRC.

use {
    crate::{
        error::CodecError,
        header::{DataMessageType, Header, MessageType, SpecificationRevision},
        message::{Message, StartOfPacket, MAX_OBJECTS},
        vdo::parse_vdm_header,
        DataRole, PowerRole,
    },
    heapless::Vec,
};

/// Largest encoded command, header plus seven data objects.
pub const MAX_COMMAND_LEN: usize = 2 + 4 * MAX_OBJECTS;

/// Encoded command as handed to the transceiver.
pub type Command = Vec<u8, MAX_COMMAND_LEN>;

/// Scans for the next frame and decodes it.
///
/// `read` fills the whole buffer it is given. Bytes that are neither a start-of-packet token nor
/// zero are skipped and handed to `on_discard`. A zero byte means the FIFO holds no frame and
/// yields `Ok(None)`.
pub fn parse_message<E>(
    mut read: impl FnMut(&mut [u8]) -> Result<(), E>,
    mut on_discard: impl FnMut(u8),
) -> Result<Option<Message>, E> {
    let mut token = [0; 1];
    let sop = loop {
        read(&mut token)?;
        match token[0] {
            0 => return Ok(None),
            byte => match StartOfPacket::from_token(byte) {
                Some(sop) => break sop,
                None => {
                    trace!("discarding {:#x}", byte);
                    on_discard(byte);
                }
            },
        }
    };

    let mut buf = [0; 2];
    read(&mut buf)?;
    let header = Header::from_bytes(buf);

    let mut objects = Vec::new();
    for _ in 0..header.num_objects() {
        let mut object = [0; 4];
        read(&mut object)?;
        // the header field holds at most 7
        let _ = objects.push(object);
    }

    let mut crc = [0; 4];
    read(&mut crc)?;

    let vdm = match header.message_type() {
        MessageType::Data(DataMessageType::VendorDefined) => {
            objects.first().map(|object| parse_vdm_header(*object))
        }
        _ => None,
    };

    Ok(Some(Message {
        header,
        sop,
        objects,
        vdm,
    }))
}

/// Header bytes followed by `data`.
pub fn encode_command(
    message_type: MessageType,
    data: &[u8],
    message_id: u8,
    revision: SpecificationRevision,
    power_role: PowerRole,
    data_role: DataRole,
) -> Result<Command, CodecError> {
    if data.len() % 4 != 0 {
        return Err(CodecError::PayloadLength(data.len()));
    }
    let num_objects = data.len() / 4;
    if num_objects > MAX_OBJECTS {
        return Err(CodecError::TooManyObjects(num_objects));
    }

    let header = Header::new(
        message_type,
        num_objects as u8,
        message_id,
        revision,
        power_role,
        data_role,
    );

    let mut command = Vec::new();
    command
        .extend_from_slice(&header.to_bytes())
        .and_then(|_| command.extend_from_slice(data))
        .map_err(|_| CodecError::TooManyObjects(num_objects))?;
    Ok(command)
}

/// Decodes an encoded command back into a message, for logging what was sent.
pub fn decode_command(command: &[u8]) -> Option<Message> {
    let (header, data) = command.split_first_chunk::<2>()?;
    let header = Header::from_bytes(*header);

    let mut objects = Vec::new();
    for object in data.chunks_exact(4).take(usize::from(header.num_objects())) {
        objects.push([object[0], object[1], object[2], object[3]]).ok()?;
    }

    let vdm = match header.message_type() {
        MessageType::Data(DataMessageType::VendorDefined) => {
            objects.first().map(|object| parse_vdm_header(*object))
        }
        _ => None,
    };

    Some(Message {
        header,
        sop: StartOfPacket::Primary,
        objects,
        vdm,
    })
}
