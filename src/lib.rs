// Activity Gauge — Telemetry & Actuation Core
//
// Two battery-powered devices over one BLE notification channel:
//
//   sensor tag     — wakes on a timer, samples the IMU, scores the
//                    motion window, pushes one 8-byte payload to any
//                    attached subscriber, powers the radio down, sleeps.
//   display meter  — scans for the tag's service, subscribes, and drives
//                    a stepper gauge + status LED from each payload;
//                    parks in an idle posture when the tag goes quiet.
//
// Everything in this crate is hardware-independent and runs against the
// capability traits in `hal`/`link`; the ESP-IDF implementations live in
// `esp` behind the `esp32` feature, and the two firmware binaries under
// `src/bin/` wire them together.

pub mod activity;
pub mod config;
pub mod display;
pub mod drivers;
pub mod hal;
pub mod link;
pub mod mailbox;
pub mod protocol;
pub mod retry;
pub mod sensor;

#[cfg(feature = "esp32")]
pub mod esp;

#[cfg(test)]
mod integration_tests;

pub use activity::{score_from_average, AccelSample, SampleWindow};
pub use display::{DisplayMachine, DisplayState};
pub use mailbox::PayloadMailbox;
pub use protocol::{ActivityPayload, DecodeError, PAYLOAD_LEN};
pub use sensor::{SensorMachine, SensorState};
