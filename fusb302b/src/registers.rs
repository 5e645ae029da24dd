//! Register map of the FUSB302B.
//!
//! Accessors come from `generate_register_accessors!`; each register type's `Default` is its
//! power-on value.

use {
    crate::{Error, Fusb302b},
    embedded_hal::blocking::i2c::{Write, WriteRead},
    proc_bitfield::bitfield,
    usb_pd::{codec::MAX_COMMAND_LEN, header::SpecificationRevision, DataRole, PowerRole},
};

/// Longest FIFO write, a whole encoded command.
const MAX_FIFO_WRITE: usize = MAX_COMMAND_LEN;

macro_rules! generate_register_read {
    ($reg:ident, $fn:ident) => {
        pub fn $fn(&mut self) -> Result<$reg, Error<E>> {
            self.read_register_raw(Register::$reg as u8).map($reg)
        }
    };
}

macro_rules! generate_register_write {
    ($reg:ident, $fn:ident) => {
        paste::item! {
            pub fn [<set_ $fn>](&mut self, value: $reg) -> Result<(), Error<E>> {
                self.write_register_raw(Register::$reg as u8, value.0)
            }
        }
    };
}

macro_rules! generate_register_clear {
    ($reg:ident, $fn:ident) => {
        paste::item! {
            pub fn [<clear_ $fn>](&mut self) -> Result<(), Error<E>> {
                self.write_register_raw(Register::$reg as u8, $reg::default().0)
            }
        }
    };
}

macro_rules! generate_register_accessors {
    () => {};

    (($reg:ident, $fn:ident, r), $($tail:tt)*) => {
        generate_register_read!($reg, $fn);

        generate_register_accessors!($($tail)*);
    };

    (($reg:ident, $fn:ident, rw), $($tail:tt)*) => {
        generate_register_read!($reg, $fn);
        generate_register_write!($reg, $fn);

        generate_register_accessors!($($tail)*);
    };

    (($reg:ident, $fn:ident, wc), $($tail:tt)*) => {
        generate_register_write!($reg, $fn);
        generate_register_clear!($reg, $fn);

        generate_register_accessors!($($tail)*);
    };

    (($reg:ident, $fn:ident, rc), $($tail:tt)*) => {
        generate_register_read!($reg, $fn);
        generate_register_clear!($reg, $fn);

        generate_register_accessors!($($tail)*);
    };

    (($reg:ident, $fn:ident, rwc), $($tail:tt)*) => {
        generate_register_read!($reg, $fn);
        generate_register_write!($reg, $fn);
        generate_register_clear!($reg, $fn);

        generate_register_accessors!($($tail)*);
    };
}

impl<I2C, E, INT, DELAY> Fusb302b<I2C, INT, DELAY>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    generate_register_accessors!(
        (DeviceId, device_id_register, r),
        (Switches0, switches0, rw),
        (Switches1, switches1, rw),
        (Measure, measure, rw),
        (Slice, slice, rw),
        (Control0, control0, rwc),
        (Control1, control1, rwc),
        (Control2, control2, rw),
        (Control3, control3, rw),
        (Mask1, mask1, rw),
        (Power, power, rw),
        (Reset, reset, wc),
        (OcPreg, ocpreg, rw),
        (MaskA, mask_a, rw),
        (MaskB, mask_b, rw),
        (Control4, control4, rw),
        (Status0A, status0a, r),
        (Status1A, status1a, r),
        (InterruptA, interrupta, rc),
        (InterruptB, interruptb, rc),
        (Status0, status0, r),
        (Status1, status1, r),
        (Interrupt, interrupt, rc),
    );

    fn read_register_raw(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut buf = [0; 1];
        self.i2c
            .write_read(self.config.address, &[register], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    fn write_register_raw(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.config.address, &[register, value])
            .map_err(Error::Bus)
    }

    /// Reads consecutive registers starting at `register`, the chip auto-increments.
    pub(crate) fn read_registers(
        &mut self,
        register: Register,
        buf: &mut [u8],
    ) -> Result<(), Error<E>> {
        self.i2c
            .write_read(self.config.address, &[register as u8], buf)
            .map_err(Error::Bus)
    }

    /// Writes `data` into the transmit FIFO in a single bus transaction.
    pub(crate) fn write_fifo_raw(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        if data.len() > MAX_FIFO_WRITE {
            return Err(Error::PacketTooLong(data.len()));
        }

        let mut buf = [0; 1 + MAX_FIFO_WRITE];
        buf[0] = Register::Fifo as u8;
        buf[1..=data.len()].copy_from_slice(data);
        self.i2c
            .write(self.config.address, &buf[..=data.len()])
            .map_err(Error::Bus)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Register {
    DeviceId = 0x01,
    Switches0 = 0x02,
    Switches1 = 0x03,
    Measure = 0x04,
    Slice = 0x05,
    Control0 = 0x06,
    Control1 = 0x07,
    Control2 = 0x08,
    Control3 = 0x09,
    Mask1 = 0x0A,
    Power = 0x0B,
    Reset = 0x0C,
    OcPreg = 0x0D,
    MaskA = 0x0E,
    MaskB = 0x0F,
    Control4 = 0x10,
    Status0A = 0x3C,
    Status1A = 0x3D,
    InterruptA = 0x3E,
    InterruptB = 0x3F,
    Status0 = 0x40,
    Status1 = 0x41,
    Interrupt = 0x42,
    Fifo = 0x43,
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DeviceId(pub u8): Debug, FromStorage, IntoStorage {
        /// 0b1000 for A revisions, 0b1001 for B
        pub version_id: u8 [read_only] @ 4..=7,
        pub product_id: u8 [read_only] @ 2..=3,
        pub revision_id: u8 [read_only] @ 0..=1,
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self(0b1001_0000)
    }
}

bitfield! {
    /// CC line switches: pull-ups, VCONN, measure block routing and pull-downs.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Switches0(pub u8): Debug, FromStorage, IntoStorage {
        pub pu_en2: bool @ 7,
        pub pu_en1: bool @ 6,
        pub vconn_cc2: bool @ 5,
        pub vconn_cc1: bool @ 4,
        /// Measure block on CC2, exclusive with `meas_cc1`
        pub meas_cc2: bool @ 3,
        pub meas_cc1: bool @ 2,
        pub pdwn2: bool @ 1,
        pub pdwn1: bool @ 0,
    }
}

impl Default for Switches0 {
    fn default() -> Self {
        Self(0b0000_0011)
    }
}

bitfield! {
    /// Transmit routing plus the header fields the chip puts into its own GoodCRC replies.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Switches1(pub u8): Debug, FromStorage, IntoStorage {
        pub powerrole: bool [get PowerRole, set PowerRole] @ 7,
        pub specrev: u8 [get SpecificationRevision, set SpecificationRevision] @ 5..=6,
        pub datarole: bool [get DataRole, set DataRole] @ 4,
        /// Acknowledge received packets with GoodCRC in hardware
        pub auto_crc: bool @ 2,
        /// BMC driver on CC2
        pub txcc2: bool @ 1,
        /// BMC driver on CC1
        pub txcc1: bool @ 0,
    }
}

impl Default for Switches1 {
    fn default() -> Self {
        Self(0b0010_0000)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Measure(pub u8): Debug, FromStorage, IntoStorage {
        /// Compare VBUS instead of the selected CC pin, both `meas_cc*` must be clear
        pub meas_vbus: bool @ 6,
        /// Comparator threshold in 42 mV steps (420 mV steps on VBUS), 0 is one step
        pub mdac: u8 @ 0..=5,
    }
}

impl Default for Measure {
    fn default() -> Self {
        Self(0b0011_0001)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Slice(pub u8): Debug, FromStorage, IntoStorage {
        /// Upper slicer threshold offset: none, +5, +0xa or +0x20 steps
        pub sda_hys: u8 @ 6..=7,
        /// BMC receive slicer threshold
        pub sdac: u8 @ 0..=5,
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self(0b0110_0000)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control0(pub u8): Debug, FromStorage, IntoStorage {
        /// Self clearing
        pub tx_flush: bool @ 6,
        /// Global interrupt mask, set at reset
        pub int_mask: bool @ 5,
        /// Pull-up strength, a `HostCurrent` code (0 disables)
        pub host_cur: u8 @ 2..=3,
        pub auto_pre: bool @ 1,
        /// Self clearing
        pub tx_start: bool @ 0,
    }
}

impl Default for Control0 {
    fn default() -> Self {
        Self(0b0010_0100)
    }
}

bitfield! {
    /// Receive FIFO flush and which SOP* kinds are accepted besides plain SOP.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control1(pub u8): Debug, FromStorage, IntoStorage {
        pub ensop2db: bool @ 6,
        pub ensop1db: bool @ 5,
        pub bist_mode2: bool @ 4,
        /// Self clearing
        pub rx_flush: bool @ 2,
        pub ensop2: bool @ 1,
        pub ensop1: bool @ 0,
    }
}

impl Default for Control1 {
    fn default() -> Self {
        Self(0b0000_0000)
    }
}

bitfield! {
    /// Autonomous toggle and wake detection.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control2(pub u8): Debug, FromStorage, IntoStorage {
        /// Pause between toggle cycles: none, 40, 80 or 160 ms
        pub tog_save_pwr: u8 @ 6..=7,
        pub tog_rd_only: bool @ 5,
        pub wake_en: bool @ 3,
        /// 0b01 DRP, 0b10 sink, 0b11 source
        pub mode: u8 @ 1..=2,
        pub toggle: bool @ 0,
    }
}

impl Default for Control2 {
    fn default() -> Self {
        Self(0b0000_0010)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control3(pub u8): Debug, FromStorage, IntoStorage {
        /// Takes priority over anything queued
        pub send_hard_reset: bool @ 6,
        pub bist_tmode: bool @ 5,
        pub auto_hardreset: bool @ 4,
        pub auto_softreset: bool @ 3,
        pub n_retries: u8 @ 1..=2,
        /// Retransmit when no GoodCRC arrives
        pub auto_retry: bool @ 0,
    }
}

impl Default for Control3 {
    fn default() -> Self {
        Self(0b0000_0110)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Mask1(pub u8): Debug, FromStorage, IntoStorage {
        pub m_vbusok: bool @ 7,
        pub m_activity: bool @ 6,
        pub m_comp_chng: bool @ 5,
        pub m_crc_chk: bool @ 4,
        pub m_alert: bool @ 3,
        pub m_wake: bool @ 2,
        pub m_collision: bool @ 1,
        pub m_bc_lvl: bool @ 0,
    }
}

impl Default for Mask1 {
    fn default() -> Self {
        Self(0b0000_0000)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Power(pub u8): Debug, FromStorage, IntoStorage {
        /// Enable internal oscillator
        pub internal_oscillator: bool @ 3,
        /// Measure block powered
        pub measure_block: bool @ 2,
        /// Receiver powered and current references for Measure block
        pub receiver: bool @ 1,
        /// Bandgap and wake circuit
        pub bandgap_wake: bool @ 0,
    }
}

impl Default for Power {
    fn default() -> Self {
        Self(0b0000_0001)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Reset(pub u8): Debug, FromStorage, IntoStorage {
        /// Reset just the PD logic for both the PD transmitter and receiver
        pub pd_reset: bool @ 1,
        /// Reset the FUSB302B including the I2C registers to their default values
        pub sw_reset: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct OcPreg(pub u8): Debug, FromStorage, IntoStorage {
        /// false: 10 mA * (OCP_CUR + 1), true: 100 mA * (OCP_CUR + 1)
        pub ocp_range: bool @ 3,
        pub ocp_cur: u8 @ 0..=2,
    }
}

impl Default for OcPreg {
    fn default() -> Self {
        Self(0b0000_1111)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MaskA(pub u8): Debug, FromStorage, IntoStorage {
        pub m_ocp_temp: bool @ 7,
        pub m_togdone: bool @ 6,
        pub m_softfail: bool @ 5,
        pub m_retryfail: bool @ 4,
        pub m_hardsent: bool @ 3,
        pub m_txsent: bool @ 2,
        pub m_softrst: bool @ 1,
        pub m_hardrst: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MaskB(pub u8): Debug, FromStorage, IntoStorage {
        pub m_gcrcsent: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control4(pub u8): Debug, FromStorage, IntoStorage {
        /// In auto Rd only Toggle mode, stop toggle at Audio accessory (Ra on both CC)
        pub tog_exit_aud: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status0A(pub u8): Debug, FromStorage, IntoStorage {
        /// All soft reset packets with retries have failed to get a GoodCRC acknowledge
        pub softfail: bool [read_only] @ 5,
        /// All packet retries have failed to get a GoodCRC acknowledge
        pub retryfail: bool [read_only] @ 4,
        /// Internal power state when logic internals needs to control the power state
        pub power: u8 [read_only] @ 2..=3,
        /// One of the packets received was a soft reset packet
        pub softrst: bool [read_only] @ 1,
        /// Hard reset PD ordered set has been received
        pub hardrst: bool [read_only] @ 0,
    }
}

/// Toggle state machine outcome, `Status1A` TOGSS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Toggle logic running
    Running,
    SourceCc1,
    SourceCc2,
    SinkCc1,
    SinkCc2,
    AudioAccessory,
    Unknown(u8),
}

impl From<u8> for Polarity {
    fn from(value: u8) -> Self {
        match value & 0b111 {
            0b000 => Self::Running,
            0b001 => Self::SourceCc1,
            0b010 => Self::SourceCc2,
            0b101 => Self::SinkCc1,
            0b110 => Self::SinkCc2,
            0b111 => Self::AudioAccessory,
            other => Self::Unknown(other),
        }
    }
}

impl From<Polarity> for u8 {
    fn from(value: Polarity) -> Self {
        match value {
            Polarity::Running => 0b000,
            Polarity::SourceCc1 => 0b001,
            Polarity::SourceCc2 => 0b010,
            Polarity::SinkCc1 => 0b101,
            Polarity::SinkCc2 => 0b110,
            Polarity::AudioAccessory => 0b111,
            Polarity::Unknown(other) => other,
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status1A(pub u8): Debug, FromStorage, IntoStorage {
        pub togss: u8 [get Polarity, set Polarity] @ 3..=5,
        /// Last packet received was SOP''_DEBUG
        pub rxsop2db: bool [read_only] @ 2,
        /// Last packet received was SOP'_DEBUG
        pub rxsop1db: bool [read_only] @ 1,
        /// Last packet received was SOP
        pub rxsop: bool [read_only] @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct InterruptA(pub u8): Debug, FromStorage, IntoStorage {
        pub i_ocp_temp: bool @ 7,
        pub i_togdone: bool @ 6,
        pub i_softfail: bool @ 5,
        pub i_retryfail: bool @ 4,
        pub i_hardsent: bool @ 3,
        pub i_txsent: bool @ 2,
        pub i_softrst: bool @ 1,
        pub i_hardrst: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct InterruptB(pub u8): Debug, FromStorage, IntoStorage {
        pub i_gcrcsent: bool @ 0,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status0(pub u8): Debug, FromStorage, IntoStorage {
        pub vbusok: bool [read_only] @ 7,
        pub activity: bool [read_only] @ 6,
        /// Measured CC voltage is above the MDAC threshold
        pub comp: bool [read_only] @ 5,
        pub crc_chk: bool [read_only] @ 4,
        pub alert: bool [read_only] @ 3,
        pub wake: bool [read_only] @ 2,
        /// Current voltage status of the measured CC pin, see `usb_pd::current_level_name`
        pub bc_lvl: u8 [read_only] @ 0..=1,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status1(pub u8): Debug, FromStorage, IntoStorage {
        pub rxsop2: bool [read_only] @ 7,
        pub rxsop1: bool [read_only] @ 6,
        pub rx_empty: bool [read_only] @ 5,
        pub rx_full: bool [read_only] @ 4,
        pub tx_empty: bool [read_only] @ 3,
        pub tx_full: bool [read_only] @ 2,
        pub overtemp: bool [read_only] @ 1,
        pub ocp: bool [read_only] @ 0,
    }
}

impl Default for Status1 {
    fn default() -> Self {
        Self(0b0010_1000)
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Interrupt(pub u8): Debug, FromStorage, IntoStorage {
        pub i_vbusok: bool @ 7,
        pub i_activity: bool @ 6,
        pub i_comp_chng: bool @ 5,
        pub i_crc_chk: bool @ 4,
        pub i_alert: bool @ 3,
        pub i_wake: bool @ 2,
        pub i_collision: bool @ 1,
        pub i_bc_lvl: bool @ 0,
    }
}
