//! Sink negotiation.
//!
//! Waits for Source_Capabilities, lets the policy choose a profile and requests it. Accept and
//! PS_RDY go to the policy, Vendor_Defined requests are answered by the DisplayPort responder.

mod display_port;

use {
    crate::{
        codec::parse_message,
        driver::{service_interrupts, Detection, Driver, Poll},
        error::Error,
        header::{ControlMessageType, DataMessageType, MessageType},
        message::{Message, MAX_OBJECTS},
        pdo::{FixedVariableRequestDataObject, PdoKind, PowerDataObject, PpsRequestDataObject},
        policy::SinkPolicy,
        sequencer::Sequencer,
        vdo::{build_vdm_header, svid_name, VdmCommandType, VdmHeader},
        CcPin, DataRole, PowerRole,
    },
    core::{
        convert::Infallible,
        sync::atomic::{AtomicBool, Ordering},
    },
    fugit::{MicrosDurationU32, MillisDurationU32},
    heapless::Vec,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Sleep at the end of every poll iteration
    pub poll_interval: MicrosDurationU32,
    /// Pause before setting up again after a stop request
    pub restart_pause: MillisDurationU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: MicrosDurationU32::micros(10),
            restart_pause: MillisDurationU32::millis(1000),
        }
    }
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Detached,
    Cancelled,
}

pub struct Sink<D, P> {
    driver: D,
    policy: P,
    config: Config,
    sequencer: Sequencer,
    /// Last received Source_Capabilities
    source_capabilities: Vec<PowerDataObject, MAX_OBJECTS>,
    cc: Option<CcPin>,
}

impl<D: Driver, P: SinkPolicy> Sink<D, P> {
    pub fn new(driver: D, policy: P, config: Config) -> Self {
        Self {
            driver,
            policy,
            config,
            sequencer: Sequencer::new(),
            source_capabilities: Vec::new(),
            cc: None,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn policy(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn release(self) -> (D, P) {
        (self.driver, self.policy)
    }

    pub fn source_capabilities(&self) -> &[PowerDataObject] {
        &self.source_capabilities
    }

    /// CC line found by the last setup.
    pub fn cc(&self) -> Option<CcPin> {
        self.cc
    }

    /// Configures the PHY for sink operation and waits for a source.
    ///
    /// Returns `None` when `stop` is raised before anything attaches.
    pub fn setup(&mut self, stop: &AtomicBool) -> Result<Option<CcPin>, Error<D::Error>> {
        self.cc = None;
        self.source_capabilities.clear();
        self.driver
            .configure(Detection::Sink)
            .map_err(Error::Driver)?;

        loop {
            if stop.load(Ordering::Relaxed) {
                return Ok(None);
            }
            if let Some(cc) = self
                .driver
                .find_cc(Detection::Sink)
                .map_err(Error::Driver)?
            {
                info!("source attached on {:?}", cc);
                self.cc = Some(cc);
                return Ok(Some(cc));
            }
            self.driver.delay_us(self.config.poll_interval.ticks());
        }
    }

    /// Polls until the source detaches or `stop` is raised.
    pub fn flow(&mut self, stop: &AtomicBool) -> Result<Outcome, Error<D::Error>> {
        self.sequencer.reset_message_id();

        loop {
            if stop.load(Ordering::Relaxed) {
                return Ok(Outcome::Cancelled);
            }
            if self.poll()? == Poll::Detached {
                return Ok(Outcome::Detached);
            }
        }
    }

    /// Initializes the PHY, then runs setup and flow for one attachment after another.
    ///
    /// A stop request ends the current session, clears `stop` and starts over after
    /// a pause. Only driver errors return.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<Infallible, Error<D::Error>> {
        self.driver.init().map_err(Error::Driver)?;

        loop {
            let outcome = match self.setup(stop)? {
                Some(_) => self.flow(stop)?,
                None => Outcome::Cancelled,
            };

            match outcome {
                Outcome::Detached => info!("detached, restarting"),
                Outcome::Cancelled => {
                    info!("stopped, restarting");
                    stop.store(false, Ordering::Relaxed);
                    self.driver.delay_ms(self.config.restart_pause.ticks());
                }
            }
        }
    }

    /// One iteration: handle a received message, log what was sent, then check interrupts.
    pub fn poll(&mut self) -> Result<Poll, Error<D::Error>> {
        let state = self.driver.rx_buffer_state().map_err(Error::Driver)?;
        if !state.empty {
            if let Some(message) = self.receive()? {
                self.handle_message(&message)?;
                info!("{}", message);
            }
        }

        self.sequencer.drain_sent();
        self.driver.delay_us(self.config.poll_interval.ticks());

        service_interrupts(&mut self.driver, Detection::Sink).map_err(Error::Driver)
    }

    fn receive(&mut self) -> Result<Option<Message>, Error<D::Error>> {
        let driver = &mut self.driver;
        parse_message(|buf| driver.read_fifo(buf), |_| {}).map_err(Error::Driver)
    }

    fn handle_message(&mut self, message: &Message) -> Result<(), Error<D::Error>> {
        match message.message_type() {
            MessageType::Control(ControlMessageType::GoodCRC) => trace!("GoodCRC"),
            MessageType::Control(ControlMessageType::Accept)
            | MessageType::Control(ControlMessageType::PsRdy) => self.policy.accepted(message),
            MessageType::Control(ControlMessageType::SoftReset) => {
                info!("soft reset");
                self.sequencer.reset_message_id();
            }
            MessageType::Data(DataMessageType::SourceCapabilities) => {
                self.source_capabilities.clear();
                for pdo in message.pdos() {
                    let _ = self.source_capabilities.push(pdo);
                }

                match self.policy.select_pdo(&self.source_capabilities) {
                    Some((index, current)) => {
                        info!("requesting {} at {} mA", index, current);
                        self.request_fixed(index, current, current)?;
                    }
                    None => warn!("no acceptable source capability"),
                }
            }
            MessageType::Data(DataMessageType::VendorDefined) => self.respond_vdm(message)?,
            _ => {}
        }
        Ok(())
    }

    fn respond_vdm(&mut self, message: &Message) -> Result<(), Error<D::Error>> {
        let Some(vdm) = message.vdm else {
            return Ok(());
        };
        let VdmHeader::Structured(request) = vdm else {
            info!("unstructured VDM from {:#x}", vdm.svid());
            return Ok(());
        };

        info!(
            "VDM {} {} {}",
            svid_name(request.svid()),
            request.command_name(),
            request.command_type().name()
        );
        display_port::log_objects(request, message.vdm_objects());

        let Some(objects) = display_port::response(request) else {
            if request.command_type() == VdmCommandType::InitiatorReq {
                warn!("unanswered VDM {}", request.command_name());
            }
            return Ok(());
        };

        let ack = request.with_command_type(VdmCommandType::ResponderAck);
        let data = build_vdm_header(VdmHeader::Structured(ack), objects)?;
        self.sequencer.send_command(
            &mut self.driver,
            MessageType::Data(DataMessageType::VendorDefined),
            &data,
            PowerRole::Sink,
            DataRole::Ufp,
        )
    }

    /// Requests the fixed supply at `index` of the last received capabilities.
    ///
    /// Currents are in mA. An index outside the capabilities is ignored with a warning.
    pub fn request_fixed(
        &mut self,
        index: usize,
        current: u32,
        max_current: u32,
    ) -> Result<(), Error<D::Error>> {
        if index >= self.source_capabilities.len() {
            warn!("no source capability {}", index);
            return Ok(());
        }

        let rdo = FixedVariableRequestDataObject::new(index, current, max_current);
        self.send_request(&rdo.to_bytes())
    }

    /// Requests `voltage_mv` at `current_ma` from the programmable supply at `index`.
    ///
    /// Ignored with a warning unless `index` refers to a programmable supply.
    pub fn request_pps(
        &mut self,
        index: usize,
        voltage_mv: u32,
        current_ma: u32,
    ) -> Result<(), Error<D::Error>> {
        match self.source_capabilities.get(index).map(PowerDataObject::kind) {
            Some(PdoKind::Pps) => {}
            _ => {
                warn!("no programmable source capability {}", index);
                return Ok(());
            }
        }

        let rdo = PpsRequestDataObject::new(index, voltage_mv, current_ma);
        self.send_request(&rdo.to_bytes())
    }

    /// Sends Soft_Reset and restarts message IDs.
    pub fn soft_reset(&mut self) -> Result<(), Error<D::Error>> {
        self.sequencer
            .soft_reset(&mut self.driver, PowerRole::Sink, DataRole::Ufp)
    }

    fn send_request(&mut self, rdo: &[u8]) -> Result<(), Error<D::Error>> {
        self.sequencer.send_command(
            &mut self.driver,
            MessageType::Data(DataMessageType::Request),
            rdo,
            PowerRole::Sink,
            DataRole::Ufp,
        )
    }
}
