// Cross-device checks: a full sensor cycle's notification bytes fed into
// the display side's mailbox, end to end through both state machines.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DisplayTimings, SensorTimings, GAUGE_MAX_STEPS};
use crate::display::{DisplayMachine, DisplayState};
use crate::drivers::gauge::MotorGauge;
use crate::drivers::imu::Lsm6ds3;
use crate::drivers::led::StatusLed;
use crate::hal::{BatteryProbe, DeepSleep, DigitalOut, RegisterBus};
use crate::link::{Connection, LinkError, SensorLink, Transmitter};
use crate::mailbox::PayloadMailbox;
use crate::sensor::{SensorMachine, SensorState};

// ---- sensor-side fixtures -------------------------------------------------

/// Bus with a healthy LSM6DS3 reporting a constant x-axis acceleration.
struct SteadyBus {
    accel_raw: [u8; 6],
}

impl SteadyBus {
    fn at_g(g: f32) -> Self {
        let counts = (g / crate::config::ACCEL_SCALE_2G) as i16;
        let x = counts.to_le_bytes();
        Self { accel_raw: [x[0], x[1], 0, 0, 0, 0] }
    }
}

impl RegisterBus for SteadyBus {
    fn write_reg(&mut self, _addr: u8, _reg: u8, _value: u8) -> anyhow::Result<()> {
        Ok(())
    }

    fn read_regs(&mut self, _addr: u8, reg: u8, out: &mut [u8]) -> anyhow::Result<()> {
        if reg == 0x0F {
            out[0] = 0x69;
        } else {
            out.copy_from_slice(&self.accel_raw[..out.len()]);
        }
        Ok(())
    }
}

struct SteadyBattery(u16);
impl BatteryProbe for SteadyBattery {
    fn read_millivolts(&mut self) -> Option<u16> {
        Some(self.0)
    }
}

/// Transmitter that "delivers" each notification straight into the
/// display's mailbox, standing in for the BLE stack between the devices.
struct LoopbackRadio {
    mailbox: Arc<PayloadMailbox>,
    frames: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Transmitter for LoopbackRadio {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    fn subscriber_attached(&mut self) -> bool {
        true
    }

    fn notify(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.frames.borrow_mut().push(bytes.to_vec());
        self.mailbox.post_encoded(bytes);
        Ok(())
    }

    fn shutdown(&mut self) {}
}

struct NoopSleep;
impl DeepSleep for NoopSleep {
    fn sleep(&mut self, _duration: Duration) {}
}

// ---- display-side fixtures ------------------------------------------------

#[derive(Clone, Default)]
struct NullPin;
impl DigitalOut for NullPin {
    fn write(&mut self, _high: bool) {}
}

struct AlwaysUp;
impl Connection for AlwaysUp {
    fn is_connected(&self) -> bool {
        true
    }
    fn disconnect(&mut self) {}
}

struct InstantLink;
impl SensorLink for InstantLink {
    type Connection = AlwaysUp;

    fn discover(&mut self, _scan_window: Duration) -> Result<AlwaysUp, LinkError> {
        Ok(AlwaysUp)
    }
}

fn fast_sensor_timings() -> SensorTimings {
    SensorTimings {
        sample_window: Duration::from_millis(20),
        sample_period: Duration::from_millis(5),
        init_retries: 3,
        init_backoff: Duration::ZERO,
        subscriber_timeout: Duration::from_millis(20),
        subscriber_poll: Duration::from_millis(5),
        settle_delay: Duration::ZERO,
        deep_sleep: Duration::ZERO,
    }
}

fn fast_display_timings() -> DisplayTimings {
    DisplayTimings {
        scan_window: Duration::from_millis(10),
        scan_retry_delay: Duration::ZERO,
        data_wait_timeout: Duration::from_millis(50),
        data_wait_poll: Duration::from_millis(5),
        idle_delay: Duration::ZERO,
    }
}

fn run_sensor_cycle<B, P, R, S>(machine: &mut SensorMachine<B, P, R, S>)
where
    B: RegisterBus,
    P: BatteryProbe,
    R: Transmitter,
    S: DeepSleep,
{
    assert_eq!(machine.state(), SensorState::Boot);
    for _ in 0..7 {
        machine.step();
    }
}

#[test]
fn sensor_cycle_moves_the_gauge_to_half_scale() {
    let mailbox = Arc::new(PayloadMailbox::new());
    let frames = Rc::new(RefCell::new(Vec::new()));

    let mut sensor = SensorMachine::new(
        Some(Lsm6ds3::new(SteadyBus::at_g(1.5))),
        Some(SteadyBattery(3700)),
        LoopbackRadio { mailbox: Arc::clone(&mailbox), frames: Rc::clone(&frames) },
        NoopSleep,
        fast_sensor_timings(),
    );
    run_sensor_cycle(&mut sensor);
    assert_eq!(frames.borrow().len(), 1);

    let pins = [NullPin, NullPin, NullPin, NullPin];
    let mut display = DisplayMachine::new(
        InstantLink,
        mailbox,
        MotorGauge::with_step_delay(Some(pins), Duration::ZERO),
        StatusLed::new(Some(NullPin)),
        fast_display_timings(),
    );
    display.step(); // Boot
    display.step(); // ScanConnect
    display.step(); // WaitForData → UpdateDisplay (payload already posted)
    assert_eq!(display.state(), DisplayState::UpdateDisplay);
    display.step();

    assert_eq!(display.gauge_position(), GAUGE_MAX_STEPS / 2);
}

#[test]
fn degraded_sensor_cycle_still_reaches_the_display() {
    let mailbox = Arc::new(PayloadMailbox::new());
    let frames = Rc::new(RefCell::new(Vec::new()));

    // No bus, no battery: the tag must still transmit a zero-score frame.
    let mut sensor: SensorMachine<SteadyBus, SteadyBattery, _, _> = SensorMachine::new(
        None,
        None,
        LoopbackRadio { mailbox: Arc::clone(&mailbox), frames: Rc::clone(&frames) },
        NoopSleep,
        fast_sensor_timings(),
    );
    run_sensor_cycle(&mut sensor);

    let payload = mailbox.take().expect("degraded frame must be delivered");
    assert_eq!(payload.activity, 0);
    assert_eq!(payload.battery_millivolts, 0);
    assert_eq!(payload.sequence, 0);
}
