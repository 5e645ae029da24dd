//! Transceiver interface consumed by the negotiation flows.

use {
    crate::{CcPin, HostCurrent},
    proc_bitfield::bitfield,
};

/// How a CC line is detected as attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Detection {
    /// We pull down, the partner advertises through its pull-up. The higher reading wins.
    Sink,
    /// We pull up with the given advertisement, the attached line reads that level back.
    Source(HostCurrent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxBufferState {
    pub empty: bool,
    pub full: bool,
}

bitfield! {
    /// General interrupt register
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Interrupt(pub u8): Debug, FromStorage, IntoStorage {
        pub vbus_ok: bool @ 7,
        pub activity: bool @ 6,
        pub comp_change: bool @ 5,
        pub crc_check: bool @ 4,
        pub alert: bool @ 3,
        pub wake: bool @ 2,
        pub collision: bool @ 1,
        pub bc_level: bool @ 0,
    }
}

/// Latched interrupt status, read in one go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interrupts {
    pub a: u8,
    pub b: u8,
    pub general: Interrupt,
}

impl From<[u8; 3]> for Interrupts {
    fn from([a, b, general]: [u8; 3]) -> Self {
        Self {
            a,
            b,
            general: Interrupt(general),
        }
    }
}

/// PD-PHY transceiver as seen by the negotiation flows.
pub trait Driver {
    type Error;

    /// Reset the chip and bring it to a known powered state.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Apply the pull-ups, pull-downs and roles for the given detection.
    fn configure(&mut self, detection: Detection) -> Result<(), Self::Error>;

    /// Measure both CC lines and prepare the attached one for communication.
    ///
    /// `None` means nothing is attached.
    fn find_cc(&mut self, detection: Detection) -> Result<Option<CcPin>, Self::Error>;

    fn rx_buffer_state(&mut self) -> Result<RxBufferState, Self::Error>;

    /// Fill `buf` from the receive FIFO.
    fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Transmit an encoded command (header and data objects).
    fn send_packet(&mut self, message: &[u8]) -> Result<(), Self::Error>;

    /// Level of the interrupt line.
    fn interrupt_asserted(&mut self) -> Result<bool, Self::Error>;

    /// Read and clear the interrupt status.
    fn interrupts(&mut self) -> Result<Interrupts, Self::Error>;

    fn delay_us(&mut self, us: u32);

    fn delay_ms(&mut self, ms: u32);
}

/// Outcome of a single poll iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Poll {
    Continue,
    Detached,
}

/// Checks the interrupt line and handles every pending condition.
///
/// A comparator change triggers a new CC measurement, detach is reported when it finds nothing.
pub(crate) fn service_interrupts<D: Driver>(
    driver: &mut D,
    detection: Detection,
) -> Result<Poll, D::Error> {
    if !driver.interrupt_asserted()? {
        return Ok(Poll::Continue);
    }

    let interrupts = driver.interrupts()?;
    debug!("interrupts {:?}", interrupts);
    let general = interrupts.general;
    let mut poll = Poll::Continue;

    if general.vbus_ok() {
        trace!("I_VBUSOK");
    }
    if general.activity() {
        trace!("I_ACTIVITY");
    }
    if general.comp_change() {
        trace!("I_COMP_CHNG");
        if driver.find_cc(detection)?.is_none() {
            info!("disconnect detected");
            poll = Poll::Detached;
        }
    }
    if general.crc_check() {
        trace!("I_CRC_CHK");
    }
    if general.alert() {
        let state = driver.rx_buffer_state()?;
        info!("I_ALERT {:?}", state);
    }
    if general.wake() {
        info!("I_WAKE");
    }
    if general.collision() {
        info!("I_COLLISION");
    }
    if general.bc_level() {
        info!("I_BC_LVL");
    }

    Ok(poll)
}
