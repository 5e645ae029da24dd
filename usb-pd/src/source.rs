//! Source negotiation.
//!
//! Advertises a fixed set of capabilities until the sink requests one of them, then hands the
//! request to the policy and answers with Accept and PS_RDY once the output has switched.

use {
    crate::{
        codec::parse_message,
        driver::{service_interrupts, Detection, Driver, Poll},
        error::{CodecError, Error},
        header::{ControlMessageType, DataMessageType, MessageType},
        message::{Message, MAX_OBJECTS},
        policy::SourcePolicy,
        sequencer::Sequencer,
        sink::Outcome,
        CcPin, DataRole, HostCurrent, PowerRole,
    },
    core::{
        convert::Infallible,
        sync::atomic::{AtomicBool, Ordering},
    },
    fugit::{MicrosDurationU32, MillisDurationU32},
    heapless::Vec,
};

const ADVERTISEMENT_LEN: usize = 4 * MAX_OBJECTS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Sleep at the end of every poll iteration
    pub poll_interval: MicrosDurationU32,
    /// Pause before setting up again after a stop request
    pub restart_pause: MillisDurationU32,
    /// Wait between attach and the first advertisement
    pub first_advertisement_delay: MillisDurationU32,
    /// Poll iterations between advertisements
    pub advertisement_period: u32,
    /// Advertisements sent per session at most, the first one included
    pub max_advertisements: u32,
    /// Wait between switching the output and PS_RDY
    pub power_settle: MillisDurationU32,
    /// Current advertised on CC
    pub host_current: HostCurrent,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: MicrosDurationU32::micros(10),
            restart_pause: MillisDurationU32::millis(1000),
            first_advertisement_delay: MillisDurationU32::millis(300),
            advertisement_period: 10_000,
            max_advertisements: 30,
            power_settle: MillisDurationU32::millis(100),
            host_current: HostCurrent::Medium,
        }
    }
}

pub struct Source<D, P> {
    driver: D,
    policy: P,
    config: Config,
    sequencer: Sequencer,
    /// Encoded PDOs sent as Source_Capabilities
    advertisement: Vec<u8, ADVERTISEMENT_LEN>,
    cc: Option<CcPin>,
    iterations: u32,
    advertisements: u32,
    /// A request arrived this session, whether or not it was served
    profile_selected: bool,
    profile: Option<usize>,
}

impl<D: Driver, P: SourcePolicy> Source<D, P> {
    /// `advertisement` holds encoded PDOs, see [`crate::pdo::build_fixed_pdo`].
    pub fn new(
        driver: D,
        policy: P,
        advertisement: &[[u8; 4]],
        config: Config,
    ) -> Result<Self, CodecError> {
        if advertisement.len() > MAX_OBJECTS {
            return Err(CodecError::TooManyObjects(advertisement.len()));
        }

        let mut encoded = Vec::new();
        for pdo in advertisement {
            encoded
                .extend_from_slice(pdo)
                .map_err(|_| CodecError::TooManyObjects(advertisement.len()))?;
        }

        Ok(Self {
            driver,
            policy,
            config,
            sequencer: Sequencer::new(),
            advertisement: encoded,
            cc: None,
            iterations: 0,
            advertisements: 0,
            profile_selected: false,
            profile: None,
        })
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

    pub fn advertisement(&self) -> &[u8] {
        &self.advertisement
    }

    pub fn cc(&self) -> Option<CcPin> {
        self.cc
    }

    /// Profile accepted in the current session.
    pub fn profile(&self) -> Option<usize> {
        self.profile
    }

    /// Cuts the output, configures the PHY for source operation and waits for a sink.
    ///
    /// The default output is enabled once a sink attaches. Returns `None` when `stop` is raised
    /// before that.
    pub fn setup(&mut self, stop: &AtomicBool) -> Result<Option<CcPin>, Error<D::Error>> {
        self.cc = None;
        self.policy.disable_output();
        let detection = self.detection();
        self.driver.configure(detection).map_err(Error::Driver)?;

        loop {
            if stop.load(Ordering::Relaxed) {
                return Ok(None);
            }
            if let Some(cc) = self.driver.find_cc(detection).map_err(Error::Driver)? {
                info!("sink attached on {:?}", cc);
                self.cc = Some(cc);
                self.policy.enable_default_output();
                return Ok(Some(cc));
            }
            self.driver.delay_us(self.config.poll_interval.ticks());
        }
    }

    /// Advertises, then polls until the sink detaches or `stop` is raised.
    pub fn flow(&mut self, stop: &AtomicBool) -> Result<Outcome, Error<D::Error>> {
        self.begin()?;

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

    fn begin(&mut self) -> Result<(), Error<D::Error>> {
        self.sequencer.reset_message_id();
        self.iterations = 0;
        self.advertisements = 0;
        self.profile_selected = false;
        self.profile = None;

        self.driver
            .delay_ms(self.config.first_advertisement_delay.ticks());
        self.advertise()
    }

    /// One iteration: handle a received message, log what was sent, re-advertise when due,
    /// then check interrupts.
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

        self.iterations += 1;
        if self.iterations >= self.config.advertisement_period {
            self.iterations = 0;
            if !self.profile_selected && self.advertisements < self.config.max_advertisements {
                self.advertise()?;
            }
        }

        let detection = self.detection();
        service_interrupts(&mut self.driver, detection).map_err(Error::Driver)
    }

    /// Sends Soft_Reset and restarts message IDs.
    pub fn soft_reset(&mut self) -> Result<(), Error<D::Error>> {
        self.sequencer
            .soft_reset(&mut self.driver, PowerRole::Source, DataRole::Dfp)
    }

    fn detection(&self) -> Detection {
        Detection::Source(self.config.host_current)
    }

    fn advertise(&mut self) -> Result<(), Error<D::Error>> {
        info!("sending advertisement");
        self.advertisements += 1;
        self.sequencer.send_command(
            &mut self.driver,
            MessageType::Data(DataMessageType::SourceCapabilities),
            &self.advertisement,
            PowerRole::Source,
            DataRole::Dfp,
        )
    }

    fn send_control(&mut self, message_type: ControlMessageType) -> Result<(), Error<D::Error>> {
        self.sequencer.send_command(
            &mut self.driver,
            MessageType::Control(message_type),
            &[],
            PowerRole::Source,
            DataRole::Dfp,
        )
    }

    fn receive(&mut self) -> Result<Option<Message>, Error<D::Error>> {
        let driver = &mut self.driver;
        parse_message(|buf| driver.read_fifo(buf), |_| {}).map_err(Error::Driver)
    }

    fn handle_message(&mut self, message: &Message) -> Result<(), Error<D::Error>> {
        match message.message_type() {
            MessageType::Control(ControlMessageType::GoodCRC) => trace!("GoodCRC"),
            MessageType::Control(ControlMessageType::SoftReset) => {
                info!("soft reset");
                self.sequencer.reset_message_id();
            }
            MessageType::Data(DataMessageType::Request) => {
                self.profile_selected = true;
                self.process_request(message)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn process_request(&mut self, message: &Message) -> Result<(), Error<D::Error>> {
        let requested = message
            .request_object()
            .and_then(|rdo| usize::from(rdo.object_position()).checked_sub(1));
        let served = requested.filter(|&profile| self.policy.validate_profile(profile, message));

        let Some(profile) = served else {
            // refused requests get no reply, the output is cut instead
            warn!("requested profile {:?} not handled", requested);
            self.profile = None;
            self.policy.disable_output();
            return Ok(());
        };

        info!("selected profile {}", profile);
        self.send_control(ControlMessageType::Accept)?;
        self.policy.switch_to_profile(profile, message);
        self.driver.delay_ms(self.config.power_settle.ticks());
        self.send_control(ControlMessageType::PsRdy)?;
        self.profile = Some(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            codec::decode_command,
            dummy::{DummyDriver, DUMMY_ERROR},
            pdo::{build_fixed_pdo, FixedVariableRequestDataObject},
        },
        std::vec::Vec as StdVec,
    };

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Event {
        Validate(usize),
        Switch(usize),
        Disable,
        EnableDefault,
    }

    struct Supply {
        profiles: usize,
        events: StdVec<Event>,
    }

    impl SourcePolicy for Supply {
        fn validate_profile(&mut self, profile: usize, _request: &Message) -> bool {
            self.events.push(Event::Validate(profile));
            profile < self.profiles
        }

        fn switch_to_profile(&mut self, profile: usize, _request: &Message) {
            self.events.push(Event::Switch(profile));
        }

        fn disable_output(&mut self) {
            self.events.push(Event::Disable);
        }

        fn enable_default_output(&mut self) {
            self.events.push(Event::EnableDefault);
        }
    }

    fn advertisement() -> [[u8; 4]; 2] {
        [
            build_fixed_pdo(5000, 1500, 0, 0x08),
            build_fixed_pdo(19000, 5000, 0, 0),
        ]
    }

    fn source(config: Config) -> Source<DummyDriver, Supply> {
        let supply = Supply {
            profiles: 2,
            events: StdVec::new(),
        };
        Source::new(DummyDriver::new(), supply, &advertisement(), config).unwrap()
    }

    /// Request frame from a sink for the object at `index`, CRC zeroed.
    fn request(index: usize) -> StdVec<u8> {
        let rdo = FixedVariableRequestDataObject::new(index, 1000, 1000);
        let mut frame = StdVec::from([0xe0, 0x82, 0x10]);
        frame.extend_from_slice(&rdo.to_bytes());
        frame.extend_from_slice(&[0; 4]);
        frame
    }

    fn sent_types(source: &mut Source<DummyDriver, Supply>) -> StdVec<MessageType> {
        source
            .driver()
            .sent
            .iter()
            .map(|packet| decode_command(packet).unwrap().message_type())
            .collect()
    }

    const CAPABILITIES: MessageType = MessageType::Data(DataMessageType::SourceCapabilities);
    const ACCEPT: MessageType = MessageType::Control(ControlMessageType::Accept);
    const PS_RDY: MessageType = MessageType::Control(ControlMessageType::PsRdy);

    #[test]
    fn rejects_oversized_advertisement() {
        let supply = Supply {
            profiles: 8,
            events: StdVec::new(),
        };
        let pdos = [build_fixed_pdo(5000, 3000, 0, 0); 8];

        let result = Source::new(DummyDriver::new(), supply, &pdos, Config::default());

        assert!(matches!(result, Err(CodecError::TooManyObjects(8))));
    }

    #[test]
    fn advertises_after_delay() {
        let mut source = source(Config::default());
        let stop = AtomicBool::new(true);

        let advertisement = source.advertisement().to_vec();

        assert_eq!(source.flow(&stop).unwrap(), Outcome::Cancelled);

        assert_eq!(source.driver().slept_ms, 300);
        let packets = &source.driver().sent;
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0][..2], [0xa1, 0x21]);
        assert_eq!(packets[0][2..], advertisement[..]);
    }

    #[test]
    fn readvertises_until_capped() {
        let mut source = source(Config {
            advertisement_period: 2,
            max_advertisements: 3,
            ..Config::default()
        });
        source.begin().unwrap();

        for _ in 0..10 {
            assert_eq!(source.poll().unwrap(), Poll::Continue);
        }

        assert_eq!(sent_types(&mut source), [CAPABILITIES; 3]);
        let ids: StdVec<u8> = source
            .driver()
            .sent
            .iter()
            .map(|packet| decode_command(packet).unwrap().header.message_id())
            .collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn serves_valid_request() {
        let mut source = source(Config {
            advertisement_period: 1,
            ..Config::default()
        });
        source.begin().unwrap();
        source.driver().inject_received_data(&request(1));

        source.poll().unwrap();
        source.poll().unwrap();

        assert_eq!(source.profile(), Some(1));
        assert_eq!(source.policy().events, [Event::Validate(1), Event::Switch(1)]);
        assert_eq!(sent_types(&mut source), [CAPABILITIES, ACCEPT, PS_RDY]);
        assert_eq!(source.driver().slept_ms, 400);
    }

    #[test]
    fn refused_request_cuts_output() {
        let mut source = source(Config {
            advertisement_period: 1,
            ..Config::default()
        });
        source.begin().unwrap();
        source.driver().inject_received_data(&request(4));

        source.poll().unwrap();
        source.poll().unwrap();

        assert_eq!(source.profile(), None);
        assert_eq!(source.policy().events, [Event::Validate(4), Event::Disable]);
        assert_eq!(sent_types(&mut source), [CAPABILITIES]);
    }

    #[test]
    fn request_without_position_is_refused() {
        let mut source = source(Config::default());
        source.begin().unwrap();
        let mut frame = request(0);
        // object position 0
        frame[6] &= 0x0f;
        source.driver().inject_received_data(&frame);

        source.poll().unwrap();

        assert_eq!(source.policy().events, [Event::Disable]);
        assert_eq!(sent_types(&mut source), [CAPABILITIES]);
    }

    #[test]
    fn setup_switches_output_around_attach() {
        let mut source = source(Config::default());
        let stop = AtomicBool::new(false);
        source.driver().cc.extend([None, Some(CcPin::CC1)]);

        assert_eq!(source.setup(&stop).unwrap(), Some(CcPin::CC1));

        let detection = Detection::Source(HostCurrent::Medium);
        assert_eq!(source.driver().configured, [detection]);
        assert_eq!(source.driver().find_cc_calls, [detection, detection]);
        assert_eq!(
            source.policy().events,
            [Event::Disable, Event::EnableDefault]
        );
    }

    #[test]
    fn detach_ends_flow() {
        let mut source = source(Config::default());
        let stop = AtomicBool::new(false);
        source.driver().interrupts.push_back([0, 0, 0b0010_0000]);
        source.driver().cc.push_back(None);

        assert_eq!(source.flow(&stop).unwrap(), Outcome::Detached);

        assert_eq!(
            source.driver().find_cc_calls,
            [Detection::Source(HostCurrent::Medium)]
        );
    }

    #[test]
    fn run_restarts_after_stop_and_surfaces_driver_errors() {
        let mut source = source(Config::default());
        let stop = AtomicBool::new(true);
        source.driver().fail_find_cc = true;

        let result = source.run(&stop);

        assert!(matches!(result, Err(Error::Driver(DUMMY_ERROR))));
        assert!(!stop.load(Ordering::Relaxed));
        assert_eq!(source.driver().slept_ms, 1000);
        assert_eq!(
            source.policy().events,
            [Event::Disable, Event::Disable]
        );
    }
}
