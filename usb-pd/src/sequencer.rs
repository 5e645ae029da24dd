use {
    crate::{
        codec::{decode_command, encode_command, Command},
        driver::Driver,
        error::Error,
        header::{ControlMessageType, MessageType, SpecificationRevision},
        DataRole, PowerRole,
    },
    heapless::Deque,
};

/// Revision advertised in every outgoing header.
pub const REVISION: SpecificationRevision = SpecificationRevision::R3_0;

/// Sent commands kept until the next log drain.
const SENT_LOG_LEN: usize = 8;

/// Message ID counter and log of transmitted commands for one session.
pub struct Sequencer {
    /// `None` until the first command of a session
    message_id: Option<u8>,
    sent: Deque<Command, SENT_LOG_LEN>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub const fn new() -> Self {
        Self {
            message_id: None,
            sent: Deque::new(),
        }
    }

    /// Re-arms the counter so the next command uses ID 0.
    pub fn reset_message_id(&mut self) {
        self.message_id = None;
    }

    /// ID of the last transmitted command.
    pub fn message_id(&self) -> Option<u8> {
        self.message_id
    }

    fn upcoming_message_id(&self) -> u8 {
        match self.message_id {
            None => 0,
            Some(id) => (id + 1) % 8,
        }
    }

    /// Encodes a command with the next message ID and transmits it.
    pub fn send_command<D: Driver>(
        &mut self,
        driver: &mut D,
        message_type: MessageType,
        data: &[u8],
        power_role: PowerRole,
        data_role: DataRole,
    ) -> Result<(), Error<D::Error>> {
        let id = self.upcoming_message_id();
        let command = encode_command(message_type, data, id, REVISION, power_role, data_role)?;
        self.message_id = Some(id);
        driver.send_packet(&command).map_err(Error::Driver)?;

        if self.sent.is_full() {
            self.sent.pop_front();
        }
        let _ = self.sent.push_back(command);
        Ok(())
    }

    /// Sends Soft_Reset and starts counting from 0 again.
    pub fn soft_reset<D: Driver>(
        &mut self,
        driver: &mut D,
        power_role: PowerRole,
        data_role: DataRole,
    ) -> Result<(), Error<D::Error>> {
        self.send_command(
            driver,
            MessageType::Control(ControlMessageType::SoftReset),
            &[],
            power_role,
            data_role,
        )?;
        self.reset_message_id();
        Ok(())
    }

    /// Logs and clears the commands sent since the last call.
    pub fn drain_sent(&mut self) {
        while let Some(command) = self.sent.pop_front() {
            match decode_command(&command) {
                Some(message) => debug!("{}", message.summary(true)),
                None => debug!("> {:?}", &command[..]),
            }
        }
    }

    /// Number of sent commands awaiting the next drain.
    pub fn pending_sent(&self) -> usize {
        self.sent.len()
    }
}
