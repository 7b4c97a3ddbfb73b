// Activity Gauge — Stepper Gauge Driver
//
// Drives the 4-coil gauge motor with a half-step sequence, one step at a
// time, until the needle position matches the target derived from the
// activity score. Direction is chosen purely by comparison — every
// intermediate position is physically visited, so worst-case latency is
// |target − position| × step delay.

use std::thread;
use std::time::Duration;

use crate::config::{GAUGE_MAX_STEPS, MOTOR_STEP_DELAY_US};
use crate::hal::DigitalOut;

const HALF_STEP_SEQUENCE: [[bool; 4]; 8] = [
    [true, false, false, false],
    [true, true, false, false],
    [false, true, false, false],
    [false, true, true, false],
    [false, false, true, false],
    [false, false, true, true],
    [false, false, false, true],
    [true, false, false, true],
];

pub struct MotorGauge<P: DigitalOut> {
    /// `None` when the coil pins were never wired — the driver then logs
    /// intent once and refuses to move or mutate position.
    pins: Option<[P; 4]>,
    step_index: usize,
    position: i32,
    step_delay: Duration,
    warned_not_ready: bool,
}

impl<P: DigitalOut> MotorGauge<P> {
    /// Build the driver. With pins present, all coils are driven low and
    /// the needle is assumed parked at position 0.
    pub fn new(pins: Option<[P; 4]>) -> Self {
        Self::with_step_delay(pins, Duration::from_micros(MOTOR_STEP_DELAY_US))
    }

    pub fn with_step_delay(mut pins: Option<[P; 4]>, step_delay: Duration) -> Self {
        if let Some(pins) = pins.as_mut() {
            for pin in pins.iter_mut() {
                pin.write(false);
            }
        }
        Self {
            pins,
            step_index: 0,
            position: 0,
            step_delay,
            warned_not_ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.pins.is_some()
    }

    /// Last commanded needle position in `[0, GAUGE_MAX_STEPS]`.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Convert a 0–100 activity score to a step target and walk the
    /// needle there. Scores above 100 saturate; an uninitialised driver
    /// is a guarded no-op.
    pub fn set_target_from_activity(&mut self, activity: u16) {
        if self.pins.is_none() {
            if !self.warned_not_ready {
                log::warn!("Gauge pins not configured; skipping motor movement");
                self.warned_not_ready = true;
            }
            return;
        }

        let clamped = i32::from(activity.min(100));
        let target = (clamped * GAUGE_MAX_STEPS / 100).clamp(0, GAUGE_MAX_STEPS);

        while self.position < target {
            self.step(1);
            self.position += 1;
        }
        while self.position > target {
            self.step(-1);
            self.position -= 1;
        }
    }

    fn step(&mut self, direction: i32) {
        self.step_index = if direction > 0 {
            (self.step_index + 1) & 0x07
        } else {
            (self.step_index + 7) & 0x07
        };
        let pattern = HALF_STEP_SEQUENCE[self.step_index];
        if let Some(pins) = self.pins.as_mut() {
            for (pin, energized) in pins.iter_mut().zip(pattern) {
                pin.write(energized);
            }
        }
        thread::sleep(self.step_delay);
    }
}
