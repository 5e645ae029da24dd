//! Receive FIFO backed by captured packets, for decoding recordings without hardware.

use {
    crate::{codec::parse_message, message::Message},
    core::convert::Infallible,
};

/// Packets skipped at most while filling a single read.
const MAX_ADVANCES: usize = 4;

pub struct Replay<'a> {
    packets: &'a [&'a [u8]],
    packet: usize,
    position: usize,
}

impl<'a> Replay<'a> {
    pub fn new(packets: &'a [&'a [u8]]) -> Self {
        Self {
            packets,
            packet: 0,
            position: 0,
        }
    }

    /// Index of the packet currently read from.
    pub fn packet(&self) -> usize {
        self.packet
    }

    fn remaining(&self) -> &'a [u8] {
        self.packets
            .get(self.packet)
            .and_then(|packet| packet.get(self.position..))
            .unwrap_or(&[])
    }

    /// Whether every packet has been read completely.
    pub fn rx_empty(&self) -> bool {
        self.remaining().is_empty()
            && self
                .packets
                .iter()
                .skip(self.packet + 1)
                .all(|packet| packet.is_empty())
    }

    /// Fills `buf`, moving on to the next packet when the current one runs out.
    ///
    /// Gives up after a bounded number of packet changes and zero pads the rest. Returns the
    /// number of bytes actually taken from the capture.
    pub fn read_fifo(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        let mut advances = 0;

        while filled < buf.len() {
            let remaining = self.remaining();
            if remaining.is_empty() {
                if advances == MAX_ADVANCES || self.packet + 1 >= self.packets.len() {
                    warn!("capture underflow, {} of {} bytes", filled, buf.len());
                    break;
                }
                advances += 1;
                self.packet += 1;
                self.position = 0;
                continue;
            }

            let count = remaining.len().min(buf.len() - filled);
            buf[filled..filled + count].copy_from_slice(&remaining[..count]);
            filled += count;
            self.position += count;
        }

        buf[filled..].fill(0);
        filled
    }

    /// Decodes the next frame of the capture.
    pub fn next_message(&mut self) -> Option<Message> {
        let read = |buf: &mut [u8]| {
            self.read_fifo(buf);
            Ok::<_, Infallible>(())
        };
        match parse_message(read, |_| {}) {
            Ok(message) => message,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            dummy::{CAPTURE_CHARGER, CAPTURE_FIVE_VOLT, CAPTURE_POWER_BANK},
            header::DataMessageType,
            pdo::PowerDataObject,
        },
    };

    #[test]
    fn exhausted_packet_zero_pads() {
        let packets: [&[u8]; 1] = [&[0xe0]];
        let mut replay = Replay::new(&packets);
        let mut token = [0; 1];
        assert_eq!(replay.read_fifo(&mut token), 1);

        let mut buf = [0xff; 4];
        assert_eq!(replay.read_fifo(&mut buf), 0);

        assert_eq!(buf, [0; 4]);
        assert!(replay.rx_empty());
    }

    #[test]
    fn gives_up_after_bounded_advances() {
        let packets: [&[u8]; 7] = [&[], &[], &[], &[], &[], &[], &[0x01]];
        let mut replay = Replay::new(&packets);

        let mut buf = [0xff; 2];
        assert_eq!(replay.read_fifo(&mut buf), 0);

        assert_eq!(buf, [0; 2]);
        assert_eq!(replay.packet(), MAX_ADVANCES);
        assert!(!replay.rx_empty());
    }

    #[test]
    fn reads_span_packets() {
        let packets: [&[u8]; 2] = [&[1, 2], &[3, 4, 5]];
        let mut replay = Replay::new(&packets);

        let mut buf = [0; 4];
        assert_eq!(replay.read_fifo(&mut buf), 4);

        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(!replay.rx_empty());
    }

    #[test]
    fn decodes_captured_capabilities() {
        let packets: [&[u8]; 3] = [&CAPTURE_CHARGER, &CAPTURE_POWER_BANK, &CAPTURE_FIVE_VOLT];
        let mut replay = Replay::new(&packets);

        let charger = replay.next_message().unwrap();
        let power_bank = replay.next_message().unwrap();
        let five_volt = replay.next_message().unwrap();

        assert!(replay.rx_empty());
        assert_eq!(replay.next_message(), None);

        assert!(charger.is_data(DataMessageType::SourceCapabilities));
        assert_eq!(charger.objects.len(), 5);

        let offers: std::vec::Vec<(u32, u32)> = power_bank
            .pdos()
            .filter_map(|pdo| match pdo {
                PowerDataObject::FixedSupply(fixed) => {
                    Some((fixed.voltage_mv(), fixed.max_current_ma()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(offers, [(5000, 3000), (9000, 2000), (12000, 1500)]);

        let Some(PowerDataObject::FixedSupply(only)) = five_volt.pdos().next() else {
            panic!("expected a fixed supply");
        };
        assert_eq!(only.voltage_mv(), 5000);
        assert_eq!(only.flags(), 0x27);
    }
}
