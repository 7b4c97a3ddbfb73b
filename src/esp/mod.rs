// Activity Gauge — ESP-IDF Capability Implementations
//
// Everything that touches the chip lives here, behind the `esp32`
// feature: I2C register bus, GPIO outputs, oneshot battery ADC, timer
// deep sleep, and the NimBLE radio roles.

pub mod ble;
pub mod hw;

pub use ble::{NimbleLink, NimbleTransmitter};
pub use hw::{EspBatteryProbe, EspDeepSleep, EspPin, I2cRegisterBus};
