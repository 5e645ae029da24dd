#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod registers;
pub mod token;

use {
    crate::{
        registers::{
            Control0, Control3, DeviceId, Mask1, MaskA, MaskB, Polarity, Register, Reset,
        },
        token::{sop_sequence, EOP_SEQUENCE},
    },
    embedded_hal::{
        blocking::{
            delay::{DelayMs, DelayUs},
            i2c::{Write, WriteRead},
        },
        digital::v2::InputPin,
    },
    fugit::MillisDurationU32,
    usb_pd::{
        codec::MAX_COMMAND_LEN,
        current_level_name,
        driver::{Detection, Driver, Interrupts, RxBufferState},
        header::SpecificationRevision,
        CcPin, DataRole, HostCurrent, PowerRole,
    },
};

/// I2C address of FUSB302BMPX
const DEVICE_ADDRESS: u8 = 0b0100010;

/// MDAC threshold while sinking, about 0.2 V
const SINK_MDAC: u8 = 0b00_0100;
/// MDAC threshold while sourcing, the top of the range
const SOURCE_MDAC: u8 = 0b11_1111;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7 bit I2C address
    pub address: u8,
    /// Wait between selecting a CC pin and reading its level
    pub cc_settle: MillisDurationU32,
    /// Wait after releasing the pull-downs before sniffing
    pub listen_settle: MillisDurationU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEVICE_ADDRESS,
            cc_settle: MillisDurationU32::millis(1),
            listen_settle: MillisDurationU32::millis(200),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("I2C bus failure")]
    Bus(E),
    #[error("failed to read the interrupt pin")]
    InterruptPin,
    #[error("packet of {0} bytes does not fit the transmit FIFO")]
    PacketTooLong(usize),
}

/// FUSB302B Programmable USB Type‐C Controller w/PD
pub struct Fusb302b<I2C, INT, DELAY> {
    i2c: I2C,
    /// Active low interrupt line
    int: INT,
    delay: DELAY,
    config: Config,
}

impl<I2C, E, INT, DELAY> Fusb302b<I2C, INT, DELAY>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    INT: InputPin,
    DELAY: DelayMs<u32> + DelayUs<u32>,
{
    pub fn new(i2c: I2C, int: INT, delay: DELAY, config: Config) -> Self {
        Self {
            i2c,
            int,
            delay,
            config,
        }
    }

    pub fn release(self) -> (I2C, INT, DELAY) {
        (self.i2c, self.int, self.delay)
    }

    /// Resets the chip, powers every block and unmasks all interrupts.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.reset()?;
        self.power_up()?;
        self.unmask_interrupts()
    }

    /// Full reset, registers return to their defaults.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.set_reset(Reset::default().with_sw_reset(true))
    }

    /// Resets only the PD transmitter and receiver logic.
    pub fn reset_protocol_logic(&mut self) -> Result<(), Error<E>> {
        self.set_reset(Reset::default().with_pd_reset(true))
    }

    pub fn power_up(&mut self) -> Result<(), Error<E>> {
        let power = self
            .power()?
            .with_bandgap_wake(true)
            .with_receiver(true)
            .with_measure_block(true)
            .with_internal_oscillator(true);
        self.set_power(power)
    }

    pub fn unmask_interrupts(&mut self) -> Result<(), Error<E>> {
        self.set_mask1(Mask1(0))?;
        self.set_mask_a(MaskA(0))?;
        self.set_mask_b(MaskB(0))
    }

    pub fn device_id(&mut self) -> Result<DeviceId, Error<E>> {
        self.device_id_register()
    }

    /// Routes the measure block to `cc`, or to neither pin.
    pub fn measure_cc(&mut self, cc: Option<CcPin>) -> Result<(), Error<E>> {
        let switches0 = self
            .switches0()?
            .with_meas_cc1(cc == Some(CcPin::CC1))
            .with_meas_cc2(cc == Some(CcPin::CC2));
        self.set_switches0(switches0)
    }

    /// Type-C level of the measured CC pin as a 2 bit comparator code.
    pub fn current_level(&mut self) -> Result<u8, Error<E>> {
        Ok(self.status0()?.bc_lvl())
    }

    fn measure_both(&mut self) -> Result<(u8, u8), Error<E>> {
        let mut levels = [0; 2];
        for (pin, level) in [CcPin::CC1, CcPin::CC2].into_iter().zip(levels.iter_mut()) {
            self.measure_cc(Some(pin))?;
            self.delay.delay_ms(self.config.cc_settle.ticks());
            *level = self.current_level()?;
        }
        trace!(
            "cc1 {} cc2 {}",
            current_level_name(levels[0]),
            current_level_name(levels[1])
        );
        Ok((levels[0], levels[1]))
    }

    /// The pin seeing the stronger pull-up, `None` when both read the same.
    pub fn detect_sink(&mut self) -> Result<Option<CcPin>, Error<E>> {
        let (cc1, cc2) = self.measure_both()?;
        Ok(match cc1.cmp(&cc2) {
            core::cmp::Ordering::Equal => None,
            core::cmp::Ordering::Less => Some(CcPin::CC2),
            core::cmp::Ordering::Greater => Some(CcPin::CC1),
        })
    }

    /// The pin reading back exactly our own advertisement, CC1 first.
    pub fn detect_source(&mut self, host_current: HostCurrent) -> Result<Option<CcPin>, Error<E>> {
        let (cc1, cc2) = self.measure_both()?;
        let code = host_current.code();
        Ok(if cc1 == code {
            Some(CcPin::CC1)
        } else if cc2 == code {
            Some(CcPin::CC2)
        } else {
            None
        })
    }

    /// Detects the attached pin and prepares it for PD traffic.
    ///
    /// The settle sequence runs after every detection. Without a partner the transmitter parks
    /// on CC1 and the measure block is disconnected.
    pub fn find_cc(&mut self, detection: Detection) -> Result<Option<CcPin>, Error<E>> {
        let cc = match detection {
            Detection::Sink => self.detect_sink()?,
            Detection::Source(host_current) => self.detect_source(host_current)?,
        };

        self.flush_receive()?;
        self.enable_transmit_switch(cc.unwrap_or(CcPin::CC1))?;
        self.measure_cc(cc)?;
        self.flush_transmit()?;
        self.flush_receive()?;
        self.reset_protocol_logic()?;
        Ok(cc)
    }

    /// Connects the BMC transmitter to `cc` with automatic GoodCRC at revision 3.0.
    pub fn enable_transmit_switch(&mut self, cc: CcPin) -> Result<(), Error<E>> {
        let switches1 = self
            .switches1()?
            .with_txcc1(cc == CcPin::CC1)
            .with_txcc2(cc == CcPin::CC2)
            .with_auto_crc(true)
            .with_specrev(SpecificationRevision::R3_0);
        self.set_switches1(switches1)
    }

    pub fn flush_receive(&mut self) -> Result<(), Error<E>> {
        let control1 = self.control1()?.with_rx_flush(true);
        self.set_control1(control1)
    }

    pub fn flush_transmit(&mut self) -> Result<(), Error<E>> {
        let control0 = self.control0()?.with_tx_flush(true);
        self.set_control0(control0)
    }

    /// Reads and thereby clears InterruptA, InterruptB and Interrupt.
    pub fn read_interrupts(&mut self) -> Result<Interrupts, Error<E>> {
        let mut ab = [0; 2];
        self.read_registers(Register::InterruptA, &mut ab)?;
        let general = self.interrupt()?;
        Ok(Interrupts::from([ab[0], ab[1], general.0]))
    }

    pub fn read_rx_buffer_state(&mut self) -> Result<RxBufferState, Error<E>> {
        let status1 = self.status1()?;
        Ok(RxBufferState {
            empty: status1.rx_empty(),
            full: status1.rx_full(),
        })
    }

    pub fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.read_registers(Register::Fifo, buf)
    }

    /// Frames `message` (header and data objects) and starts transmission.
    pub fn send_packet(&mut self, message: &[u8]) -> Result<(), Error<E>> {
        if message.len() > MAX_COMMAND_LEN {
            return Err(Error::PacketTooLong(message.len()));
        }

        self.write_fifo_raw(&sop_sequence(message.len() as u8))?;
        self.write_fifo_raw(message)?;
        self.write_fifo_raw(&EOP_SEQUENCE)
    }

    /// Interrupts enabled, automatic retries (3) on.
    pub fn set_controls_sink(&mut self) -> Result<(), Error<E>> {
        self.set_control0(Control0(0))?;
        self.set_control3(Control3(0).with_auto_retry(true).with_n_retries(0b11))
    }

    /// Interrupts enabled, `host_current` on the pull-ups, 3 retries but no automatic retry.
    pub fn set_controls_source(&mut self, host_current: HostCurrent) -> Result<(), Error<E>> {
        self.set_control0(Control0(0).with_host_cur(host_current.code()))?;
        self.set_control3(Control3(0).with_n_retries(0b11))
    }

    /// Roles used in automatically generated GoodCRC headers.
    pub fn set_roles(
        &mut self,
        power_role: PowerRole,
        data_role: DataRole,
    ) -> Result<(), Error<E>> {
        let switches1 = self
            .switches1()?
            .with_powerrole(power_role)
            .with_datarole(data_role);
        self.set_switches1(switches1)
    }

    pub fn set_wake(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let control2 = self.control2()?.with_wake_en(enabled);
        self.set_control2(control2)
    }

    /// Sets the 6 bit measure DAC, leaving the VBUS measure bit alone.
    pub fn set_mdac(&mut self, value: u8) -> Result<(), Error<E>> {
        let measure = self.measure()?.with_mdac(value & 0b11_1111);
        self.set_measure(measure)
    }

    /// Host pull-ups on both CC pins.
    pub fn enable_pullups(&mut self) -> Result<(), Error<E>> {
        let switches0 = self.switches0()?.with_pu_en1(true).with_pu_en2(true);
        self.set_switches0(switches0)
    }

    pub fn enable_pulldowns(&mut self) -> Result<(), Error<E>> {
        let switches0 = self.switches0()?.with_pdwn1(true).with_pdwn2(true);
        self.set_switches0(switches0)
    }

    pub fn disable_pulldowns(&mut self) -> Result<(), Error<E>> {
        let switches0 = self.switches0()?.with_pdwn1(false).with_pdwn2(false);
        self.set_switches0(switches0)
    }

    /// Receive SOP', SOP'' and their debug variants as well.
    pub fn enable_sop_prime(&mut self) -> Result<(), Error<E>> {
        let control1 = self
            .control1()?
            .with_ensop1(true)
            .with_ensop2(true)
            .with_ensop1db(true)
            .with_ensop2db(true);
        self.set_control1(control1)
    }

    pub fn send_hard_reset(&mut self) -> Result<(), Error<E>> {
        error!("sending hard reset");
        let control3 = self.control3()?.with_send_hard_reset(true);
        self.set_control3(control3)
    }

    /// Outcome of the autonomous toggle logic.
    pub fn polarity(&mut self) -> Result<Polarity, Error<E>> {
        Ok(self.status1a()?.togss())
    }

    /// Applies pull-downs or pull-ups, roles, wake and comparator threshold.
    pub fn configure(&mut self, detection: Detection) -> Result<(), Error<E>> {
        match detection {
            Detection::Sink => {
                self.set_controls_sink()?;
                self.set_roles(PowerRole::Sink, DataRole::Ufp)?;
                self.set_wake(true)?;
                self.set_mdac(SINK_MDAC)
            }
            Detection::Source(host_current) => {
                self.set_controls_source(host_current)?;
                self.set_roles(PowerRole::Source, DataRole::Dfp)?;
                self.disable_pulldowns()?;
                self.set_wake(true)?;
                self.enable_pullups()?;
                self.set_mdac(SOURCE_MDAC)
            }
        }
    }

    /// Passive sniffing on `cc`: no pull-downs, every SOP kind received.
    pub fn listen(&mut self, cc: CcPin) -> Result<(), Error<E>> {
        self.flush_receive()?;
        self.disable_pulldowns()?;
        self.delay.delay_ms(self.config.listen_settle.ticks());
        self.measure_cc(Some(cc))?;
        self.enable_sop_prime()?;
        self.flush_transmit()?;
        self.flush_receive()?;
        self.reset_protocol_logic()
    }
}

impl<I2C, E, INT, DELAY> Driver for Fusb302b<I2C, INT, DELAY>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    INT: InputPin,
    DELAY: DelayMs<u32> + DelayUs<u32>,
{
    type Error = Error<E>;

    fn init(&mut self) -> Result<(), Self::Error> {
        Fusb302b::init(self)
    }

    fn configure(&mut self, detection: Detection) -> Result<(), Self::Error> {
        Fusb302b::configure(self, detection)
    }

    fn find_cc(&mut self, detection: Detection) -> Result<Option<CcPin>, Self::Error> {
        Fusb302b::find_cc(self, detection)
    }

    fn rx_buffer_state(&mut self) -> Result<RxBufferState, Self::Error> {
        self.read_rx_buffer_state()
    }

    fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        Fusb302b::read_fifo(self, buf)
    }

    fn send_packet(&mut self, message: &[u8]) -> Result<(), Self::Error> {
        Fusb302b::send_packet(self, message)
    }

    fn interrupt_asserted(&mut self) -> Result<bool, Self::Error> {
        self.int.is_low().map_err(|_| Error::InterruptPin)
    }

    fn interrupts(&mut self) -> Result<Interrupts, Self::Error> {
        self.read_interrupts()
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
