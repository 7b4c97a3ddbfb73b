// Activity Gauge — Display Meter Entry Point
//
// Boot sequence:
//   1. Bring up logging and peripherals.
//   2. Park the gauge coils and LED, wire the NimBLE scanner to the
//      payload mailbox.
//   3. Hand off to the display state machine: scan → subscribe → drive
//      the gauge from each payload, idle on silence, rescan on link loss.

use std::sync::Arc;

use activity_gauge::config::{self, DisplayTimings};
use activity_gauge::display::DisplayMachine;
use activity_gauge::drivers::gauge::MotorGauge;
use activity_gauge::drivers::led::StatusLed;
use activity_gauge::esp::{EspPin, NimbleLink};
use activity_gauge::mailbox::PayloadMailbox;

use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::prelude::*;

fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("{} firmware starting…", config::DISPLAY_DEVICE_NAME);

    let peripherals = Peripherals::take()?;

    // ---- Gauge coils (GPIO2..GPIO5) and status LED (GPIO20) ---------------
    // Any pin that fails to configure degrades its driver to a logged
    // no-op; the device keeps running either way.
    let coils = (|| -> anyhow::Result<[EspPin; 4]> {
        Ok([
            EspPin::new(PinDriver::output(peripherals.pins.gpio2.downgrade_output())?),
            EspPin::new(PinDriver::output(peripherals.pins.gpio3.downgrade_output())?),
            EspPin::new(PinDriver::output(peripherals.pins.gpio4.downgrade_output())?),
            EspPin::new(PinDriver::output(peripherals.pins.gpio5.downgrade_output())?),
        ])
    })();
    let gauge = match coils {
        Ok(pins) => MotorGauge::new(Some(pins)),
        Err(e) => {
            log::error!("Gauge pin bring-up failed: {}; display will be log-only", e);
            MotorGauge::new(None)
        }
    };

    let led = match PinDriver::output(peripherals.pins.gpio20.downgrade_output()) {
        Ok(pin) => StatusLed::new(Some(EspPin::new(pin))),
        Err(e) => {
            log::error!("Status LED bring-up failed: {}", e);
            StatusLed::new(None)
        }
    };

    // ---- Radio + mailbox --------------------------------------------------
    let mailbox = Arc::new(PayloadMailbox::new());
    let link = NimbleLink::new(Arc::clone(&mailbox));

    // ---- State machine ----------------------------------------------------
    let mut machine = DisplayMachine::new(link, mailbox, gauge, led, DisplayTimings::default());
    machine.run()
}
