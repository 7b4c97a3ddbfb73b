// Activity Gauge — Hardware Capability Interfaces
//
// The state machines never touch a peripheral directly; they call these
// traits. Each capability may be absent at wiring time (`Option<T>` in the
// machine context), and every later state consults the availability record
// computed once at boot instead of re-checking hardware.

use std::time::Duration;

use crate::config::{BATTERY_ADC_MAX, BATTERY_FULL_SCALE_MV};

/// Register-level access to a bus-attached sensor.
pub trait RegisterBus {
    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> anyhow::Result<()>;
    fn read_regs(&mut self, addr: u8, reg: u8, out: &mut [u8]) -> anyhow::Result<()>;
}

/// One push-pull output pin.
pub trait DigitalOut {
    fn write(&mut self, high: bool);
}

/// Battery voltage input. `None` means the read itself failed; a missing
/// ADC is represented by not wiring a probe at all.
pub trait BatteryProbe {
    fn read_millivolts(&mut self) -> Option<u16>;
}

/// Timer-based deep suspension. On real hardware this does not return —
/// the chip resets and re-enters the firmware from its boot path. Host
/// implementations return so tests can observe the wake-up transition.
pub trait DeepSleep {
    fn sleep(&mut self, duration: Duration);
}

/// Convert a raw 12-bit ADC reading to millivolts (3.3 V full scale).
pub fn adc_raw_to_millivolts(raw: u16) -> u16 {
    (u32::from(raw) * BATTERY_FULL_SCALE_MV / BATTERY_ADC_MAX) as u16
}

// ---------------------------------------------------------------------------
// Capability availability records — computed in Boot, read-only afterwards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct SensorCapabilities {
    /// Sensor bus pins wired and a bus driver constructed.
    pub sensor_bus: bool,
    /// Battery ADC input wired.
    pub battery_adc: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayCapabilities {
    /// All four stepper coil pins wired and parked.
    pub gauge: bool,
    /// Status LED pin wired.
    pub status_led: bool,
}
