//! Implements a dummy driver for testing.

use {
    crate::{
        driver::{Detection, Driver, Interrupts, RxBufferState},
        CcPin,
    },
    std::{collections::VecDeque, vec::Vec},
};

/// The only error the dummy driver reports.
pub const DUMMY_ERROR: &str = "dummy failure";

/// A dummy driver for testing.
///
/// Received bytes, interrupts and CC detection results are scripted up front, transmissions
/// and configuration calls are recorded.
pub struct DummyDriver {
    /// Receive FIFO contents
    pub rx: VecDeque<u8>,
    /// Transmitted packets
    pub sent: Vec<Vec<u8>>,
    /// Interrupt status, one entry per assertion of the interrupt line
    pub interrupts: VecDeque<[u8; 3]>,
    /// Detection results, `Some(CC1)` once exhausted
    pub cc: VecDeque<Option<CcPin>>,
    pub find_cc_calls: Vec<Detection>,
    pub configured: Vec<Detection>,
    pub initialized: usize,
    pub interrupt_reads: usize,
    /// Milliseconds slept in total
    pub slept_ms: u32,
    pub fail_find_cc: bool,
}

impl DummyDriver {
    /// Create a new dummy driver.
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            sent: Vec::new(),
            interrupts: VecDeque::new(),
            cc: VecDeque::new(),
            find_cc_calls: Vec::new(),
            configured: Vec::new(),
            initialized: 0,
            interrupt_reads: 0,
            slept_ms: 0,
            fail_find_cc: false,
        }
    }

    /// Inject a received frame that can be retrieved later.
    pub fn inject_received_data(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }
}

impl Driver for DummyDriver {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.initialized += 1;
        Ok(())
    }

    fn configure(&mut self, detection: Detection) -> Result<(), Self::Error> {
        self.configured.push(detection);
        Ok(())
    }

    fn find_cc(&mut self, detection: Detection) -> Result<Option<CcPin>, Self::Error> {
        if self.fail_find_cc {
            return Err(DUMMY_ERROR);
        }
        self.find_cc_calls.push(detection);
        Ok(self.cc.pop_front().unwrap_or(Some(CcPin::CC1)))
    }

    fn rx_buffer_state(&mut self) -> Result<RxBufferState, Self::Error> {
        Ok(RxBufferState {
            empty: self.rx.is_empty(),
            full: false,
        })
    }

    fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for byte in buf.iter_mut() {
            *byte = self.rx.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn send_packet(&mut self, message: &[u8]) -> Result<(), Self::Error> {
        self.sent.push(message.to_vec());
        Ok(())
    }

    fn interrupt_asserted(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.interrupts.is_empty())
    }

    fn interrupts(&mut self) -> Result<Interrupts, Self::Error> {
        self.interrupt_reads += 1;
        Ok(self.interrupts.pop_front().unwrap_or_default().into())
    }

    fn delay_us(&mut self, _us: u32) {
        // Return immediately.
    }

    fn delay_ms(&mut self, ms: u32) {
        self.slept_ms += ms;
    }
}

/// Captured Source_Capabilities from a 100 W charger.
///
/// - Fixed 5 V at 3 A
/// - Fixed 9 V at 3 A
/// - Fixed 15 V at 3 A
/// - Fixed 20 V at 3 A
/// - PPS 3.3-21 V at 3 A
pub const CAPTURE_CHARGER: [u8; 27] = [
    0xe0, // SOP
    0xa1, // Header
    0x51, // Header
    0x2c, 0x91, 0x01, 0x08, // Fixed 5V @ 3A
    0x2c, 0xd1, 0x02, 0x00, // Fixed 9V @ 3A
    0x2c, 0xb1, 0x04, 0x00, // Fixed 15V @ 3A
    0x2c, 0x41, 0x06, 0x00, // Fixed 20V @ 3A
    0x3c, 0x21, 0xa4, 0xc9, // PPS 3.3-21V @ 3A
    0xf5, 0x9b, 0x8b, 0x55, // CRC
];

/// Captured Source_Capabilities from a power bank.
///
/// - Fixed 5 V at 3 A
/// - Fixed 9 V at 2 A
/// - Fixed 12 V at 1.5 A
pub const CAPTURE_POWER_BANK: [u8; 19] = [
    0xe0, 0xa1, 0x31, 0x2c, 0x91, 0x01, 0x08, 0xc8, 0xd0, 0x02, 0x08, 0x96, 0xc0, 0x03, 0x08,
    0x2e, 0x0c, 0xbe, 0xda,
];

/// Captured Source_Capabilities from a 5 V only supply.
pub const CAPTURE_FIVE_VOLT: [u8; 11] = [
    0xe0, 0xa1, 0x11, 0x2c, 0x91, 0x01, 0x27, 0xb1, 0x9b, 0x26, 0x94,
];
