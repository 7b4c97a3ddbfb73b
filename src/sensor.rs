// Activity Gauge — Sensor Tag State Machine
//
// One pass through the cycle per wake-up:
//
//   Boot → SensorInit → Sampling → Scoring → Transmitting → PowerDown
//        → Sleeping → (deep sleep, timer wake) → Boot
//
// Every failure degrades instead of halting: missing bus pins or a dead
// accelerometer still produce a (zero-score) transmission, and a cycle
// with no subscriber drops its score rather than queueing it. The radio
// is torn down on every path out of Transmitting — it must never be left
// running into deep sleep.

use std::thread;
use std::time::Instant;

use crate::activity::SampleWindow;
use crate::config::SensorTimings;
use crate::drivers::imu::Lsm6ds3;
use crate::hal::{BatteryProbe, DeepSleep, RegisterBus, SensorCapabilities};
use crate::link::Transmitter;
use crate::protocol::ActivityPayload;
use crate::retry::retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Boot,
    SensorInit,
    Sampling,
    Scoring,
    Transmitting,
    PowerDown,
    Sleeping,
}

pub struct SensorMachine<B, P, R, S>
where
    B: RegisterBus,
    P: BatteryProbe,
    R: Transmitter,
    S: DeepSleep,
{
    state: SensorState,
    timings: SensorTimings,
    caps: SensorCapabilities,

    imu: Option<Lsm6ds3<B>>,
    battery: Option<P>,
    radio: R,
    sleeper: S,

    // Per-cycle working set, reset in Boot.
    sensor_ready: bool,
    window: SampleWindow,
    activity: u16,
    battery_mv: u16,

    // Increments once per cycle in PowerDown, sent or not. Real deep
    // sleep resets RAM, so on hardware a fresh counter per wake is the
    // expected outcome — nothing here assumes survival across Sleeping.
    sequence: u32,
}

impl<B, P, R, S> SensorMachine<B, P, R, S>
where
    B: RegisterBus,
    P: BatteryProbe,
    R: Transmitter,
    S: DeepSleep,
{
    pub fn new(
        imu: Option<Lsm6ds3<B>>,
        battery: Option<P>,
        radio: R,
        sleeper: S,
        timings: SensorTimings,
    ) -> Self {
        Self {
            state: SensorState::Boot,
            timings,
            caps: SensorCapabilities::default(),
            imu,
            battery,
            radio,
            sleeper,
            sensor_ready: false,
            window: SampleWindow::new(),
            activity: 0,
            battery_mv: 0,
            sequence: 0,
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn capabilities(&self) -> SensorCapabilities {
        self.caps
    }

    pub fn sensor_ready(&self) -> bool {
        self.sensor_ready
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn activity(&self) -> u16 {
        self.activity
    }

    /// Drive the machine forever. Sleeping suspends the processor; on
    /// real hardware the wake-up restarts the firmware at its entry
    /// point, which lands back here in Boot.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Advance exactly one state transition.
    pub fn step(&mut self) {
        match self.state {
            SensorState::Boot => self.on_boot(),
            SensorState::SensorInit => self.on_sensor_init(),
            SensorState::Sampling => self.on_sampling(),
            SensorState::Scoring => self.on_scoring(),
            SensorState::Transmitting => self.on_transmitting(),
            SensorState::PowerDown => self.on_power_down(),
            SensorState::Sleeping => self.on_sleeping(),
        }
    }

    fn on_boot(&mut self) {
        log::info!("[stage] boot");
        self.caps = SensorCapabilities {
            sensor_bus: self.imu.is_some(),
            battery_adc: self.battery.is_some(),
        };
        if !self.caps.sensor_bus {
            log::error!("Sensor bus pins not configured; cycles will report activity=0");
        }

        self.sensor_ready = false;
        self.window.reset();
        self.activity = 0;
        self.battery_mv = 0;

        self.state = SensorState::SensorInit;
    }

    fn on_sensor_init(&mut self) {
        let retries = self.timings.init_retries;
        let backoff = self.timings.init_backoff;
        match self.imu.as_mut() {
            None => log::warn!("Sensor bus missing; IMU init skipped"),
            Some(imu) => match retry(retries, backoff, || imu.init()) {
                Ok(()) => self.sensor_ready = true,
                Err(e) => {
                    log::warn!(
                        "IMU init failed after {} attempts ({}); using activity=0",
                        retries,
                        e
                    );
                }
            },
        }
        self.state = SensorState::Sampling;
    }

    fn on_sampling(&mut self) {
        log::info!("[stage] sampling");
        self.window.reset();

        match self.imu.as_mut() {
            Some(imu) if self.sensor_ready => {
                let started = Instant::now();
                while started.elapsed() < self.timings.sample_window {
                    if let Ok(sample) = imu.read_accel() {
                        self.window.record(sample);
                    }
                    thread::sleep(self.timings.sample_period);
                }
                log::info!("IMU samples: {}", self.window.sample_count());
            }
            _ => log::warn!("IMU not ready; skipping sampling"),
        }
        self.state = SensorState::Scoring;
    }

    fn on_scoring(&mut self) {
        self.activity = self.window.score();
        self.battery_mv = self
            .battery
            .as_mut()
            .and_then(|probe| probe.read_millivolts())
            .unwrap_or(0);

        log::info!("Activity: {} (battery {} mV)", self.activity, self.battery_mv);
        self.state = SensorState::Transmitting;
    }

    fn on_transmitting(&mut self) {
        log::info!("[stage] radio on");

        if let Err(e) = self.radio.start_advertising() {
            log::error!("Radio bring-up failed: {}; dropping this cycle", e);
            self.radio.shutdown();
            self.state = SensorState::PowerDown;
            return;
        }

        let deadline = Instant::now() + self.timings.subscriber_timeout;
        while !self.radio.subscriber_attached() && Instant::now() < deadline {
            thread::sleep(self.timings.subscriber_poll);
        }

        if self.radio.subscriber_attached() {
            let payload = ActivityPayload {
                sequence: self.sequence,
                activity: self.activity,
                battery_millivolts: self.battery_mv,
            };
            log::info!("[stage] notify seq={}", payload.sequence);
            match self.radio.notify(&payload.encode()) {
                // Give the stack time to flush the notification before the
                // radio goes away.
                Ok(()) => thread::sleep(self.timings.settle_delay),
                Err(e) => log::warn!("Notify failed: {}", e),
            }
        } else {
            // Stale data is worth less than battery: drop, don't queue.
            log::warn!("No subscriber attached before timeout; dropping score");
        }

        self.radio.shutdown();
        log::info!("[stage] radio off");
        self.state = SensorState::PowerDown;
    }

    fn on_power_down(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
        self.state = SensorState::Sleeping;
    }

    fn on_sleeping(&mut self) {
        log::info!("[stage] deep sleep ({:?})", self.timings.deep_sleep);
        self.sleeper.sleep(self.timings.deep_sleep);
        // Only reachable when the sleep capability returns (host tests,
        // light-sleep stand-ins). Hardware wakes through Boot anyway.
        self.state = SensorState::Boot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IMU_ADDR_PRIMARY, SensorTimings};
    use crate::link::LinkError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn test_timings() -> SensorTimings {
        SensorTimings {
            sample_window: Duration::from_millis(30),
            sample_period: Duration::from_millis(5),
            init_retries: 3,
            init_backoff: Duration::ZERO,
            subscriber_timeout: Duration::from_millis(40),
            subscriber_poll: Duration::from_millis(5),
            settle_delay: Duration::ZERO,
            deep_sleep: Duration::ZERO,
        }
    }

    // ---- scripted register bus --------------------------------------------

    struct ScriptedBus {
        /// WHO_AM_I answers per probe; `init_failures` leading init
        /// attempts report no device at all.
        init_failures: u32,
        accel_raw: [u8; 6],
    }

    impl ScriptedBus {
        fn healthy(accel_counts_x: i16) -> Self {
            let x = accel_counts_x.to_le_bytes();
            Self { init_failures: 0, accel_raw: [x[0], x[1], 0, 0, 0, 0] }
        }

        fn dead() -> Self {
            Self { init_failures: u32::MAX, accel_raw: [0; 6] }
        }
    }

    impl RegisterBus for ScriptedBus {
        fn write_reg(&mut self, _addr: u8, _reg: u8, _value: u8) -> anyhow::Result<()> {
            Ok(())
        }

        fn read_regs(&mut self, addr: u8, reg: u8, out: &mut [u8]) -> anyhow::Result<()> {
            if reg == 0x0F {
                // WHO_AM_I probe
                if self.init_failures > 0 {
                    if addr != IMU_ADDR_PRIMARY {
                        // Count one failed init per probe pair.
                        self.init_failures = self.init_failures.saturating_sub(1);
                    }
                    anyhow::bail!("no ack");
                }
                out[0] = 0x69;
                return Ok(());
            }
            out.copy_from_slice(&self.accel_raw[..out.len()]);
            Ok(())
        }
    }

    // ---- mocks for the remaining capabilities -----------------------------

    struct FixedBattery(u16);
    impl BatteryProbe for FixedBattery {
        fn read_millivolts(&mut self) -> Option<u16> {
            Some(self.0)
        }
    }

    #[derive(Default, Clone)]
    struct RadioLog {
        advertising_started: u32,
        shutdowns: u32,
        sent: Vec<Vec<u8>>,
    }

    struct MockRadio {
        peer_attaches: bool,
        fail_bring_up: bool,
        log: Rc<RefCell<RadioLog>>,
    }

    impl MockRadio {
        fn new(peer_attaches: bool) -> (Self, Rc<RefCell<RadioLog>>) {
            let log = Rc::new(RefCell::new(RadioLog::default()));
            (
                Self { peer_attaches, fail_bring_up: false, log: Rc::clone(&log) },
                log,
            )
        }
    }

    impl Transmitter for MockRadio {
        fn start_advertising(&mut self) -> Result<(), LinkError> {
            if self.fail_bring_up {
                return Err(LinkError::Radio("controller fault".into()));
            }
            self.log.borrow_mut().advertising_started += 1;
            Ok(())
        }

        fn subscriber_attached(&mut self) -> bool {
            self.peer_attaches
        }

        fn notify(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
            self.log.borrow_mut().sent.push(bytes.to_vec());
            Ok(())
        }

        fn shutdown(&mut self) {
            self.log.borrow_mut().shutdowns += 1;
        }
    }

    struct NoopSleep;
    impl DeepSleep for NoopSleep {
        fn sleep(&mut self, _duration: Duration) {}
    }

    type TestMachine = SensorMachine<ScriptedBus, FixedBattery, MockRadio, NoopSleep>;

    fn machine(bus: ScriptedBus, radio: MockRadio) -> TestMachine {
        SensorMachine::new(
            Some(Lsm6ds3::new(bus)),
            Some(FixedBattery(3700)),
            radio,
            NoopSleep,
            test_timings(),
        )
    }

    fn run_one_cycle(m: &mut TestMachine) {
        assert_eq!(m.state(), SensorState::Boot);
        for _ in 0..7 {
            m.step();
        }
        assert_eq!(m.state(), SensorState::Boot);
    }

    #[test]
    fn happy_cycle_transmits_scored_payload() {
        // 1.5 g on x, 0 elsewhere → average 1.5 → score 50.
        let counts = (1.5 / 0.000_061) as i16;
        let (radio, log) = MockRadio::new(true);
        let mut m = machine(ScriptedBus::healthy(counts), radio);

        run_one_cycle(&mut m);

        let log = log.borrow();
        assert_eq!(log.advertising_started, 1);
        assert_eq!(log.shutdowns, 1);
        assert_eq!(log.sent.len(), 1);
        let payload = ActivityPayload::decode(&log.sent[0]).unwrap();
        assert_eq!(payload.sequence, 0);
        assert_eq!(payload.activity, 50);
        assert_eq!(payload.battery_millivolts, 3700);
        assert_eq!(m.sequence(), 1);
    }

    #[test]
    fn dead_sensor_still_transmits_zero_score() {
        let (radio, log) = MockRadio::new(true);
        let mut m = machine(ScriptedBus::dead(), radio);

        run_one_cycle(&mut m);

        assert!(!m.sensor_ready());
        let log = log.borrow();
        assert_eq!(log.sent.len(), 1, "degraded cycle must still transmit");
        let payload = ActivityPayload::decode(&log.sent[0]).unwrap();
        assert_eq!(payload.activity, 0);
    }

    #[test]
    fn missing_bus_degrades_without_touching_the_radio_contract() {
        let (radio, log) = MockRadio::new(true);
        let mut m: TestMachine =
            SensorMachine::new(None, None, radio, NoopSleep, test_timings());

        run_one_cycle(&mut m);

        assert!(!m.capabilities().sensor_bus);
        assert!(!m.capabilities().battery_adc);
        let log = log.borrow();
        let payload = ActivityPayload::decode(&log.sent[0]).unwrap();
        assert_eq!(payload.activity, 0);
        assert_eq!(payload.battery_millivolts, 0);
    }

    #[test]
    fn no_subscriber_drops_the_score_but_advances_sequence() {
        let (radio, log) = MockRadio::new(false);
        let mut m = machine(ScriptedBus::healthy(0), radio);

        run_one_cycle(&mut m);

        let log = log.borrow();
        assert!(log.sent.is_empty(), "score must be dropped, not queued");
        assert_eq!(log.shutdowns, 1, "radio must be torn down regardless");
        assert_eq!(m.sequence(), 1, "sequence increments sent-or-not");
    }

    #[test]
    fn radio_bring_up_failure_still_tears_down() {
        let (mut radio, log) = MockRadio::new(true);
        radio.fail_bring_up = true;
        let mut m = machine(ScriptedBus::healthy(0), radio);

        run_one_cycle(&mut m);

        let log = log.borrow();
        assert_eq!(log.advertising_started, 0);
        assert_eq!(log.shutdowns, 1);
        assert_eq!(m.sequence(), 1);
    }

    #[test]
    fn sequence_keeps_counting_across_cycles() {
        let (radio, _log) = MockRadio::new(true);
        let mut m = machine(ScriptedBus::healthy(0), radio);

        run_one_cycle(&mut m);
        run_one_cycle(&mut m);
        run_one_cycle(&mut m);
        assert_eq!(m.sequence(), 3);
    }

    #[test]
    fn state_order_is_the_specified_cycle() {
        let (radio, _log) = MockRadio::new(false);
        let mut m = machine(ScriptedBus::healthy(0), radio);

        let expected = [
            SensorState::Boot,
            SensorState::SensorInit,
            SensorState::Sampling,
            SensorState::Scoring,
            SensorState::Transmitting,
            SensorState::PowerDown,
            SensorState::Sleeping,
        ];
        for state in expected {
            assert_eq!(m.state(), state);
            m.step();
        }
        assert_eq!(m.state(), SensorState::Boot);
    }
}
