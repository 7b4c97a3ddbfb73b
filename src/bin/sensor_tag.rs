// Activity Gauge — Sensor Tag Entry Point
//
// Wake cycle:
//   1. Bring up logging and peripherals.
//   2. Wire the capability implementations (I2C IMU bus, battery ADC,
//      NimBLE transmitter, timer deep sleep).
//   3. Hand off to the sensor state machine, which samples, scores,
//      transmits once, and puts the chip into deep sleep. The timer
//      wake-up lands back here in `main`.

use activity_gauge::config::{self, SensorTimings};
use activity_gauge::drivers::imu::Lsm6ds3;
use activity_gauge::esp::{EspBatteryProbe, EspDeepSleep, I2cRegisterBus, NimbleTransmitter};
use activity_gauge::sensor::SensorMachine;

use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;

fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("{} firmware starting…", config::SENSOR_DEVICE_NAME);

    let peripherals = Peripherals::take()?;

    // ---- Sensor bus (GPIO6 SDA / GPIO7 SCL) -------------------------------
    // A failed bring-up is a degraded boot, not a fatal one: the machine
    // still runs its cycle and transmits activity=0.
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let imu = match I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    ) {
        Ok(i2c) => Some(Lsm6ds3::new(I2cRegisterBus::new(i2c))),
        Err(e) => {
            log::error!("I2C bring-up failed: {}; running without IMU", e);
            None
        }
    };

    // ---- Battery ADC (GPIO2) ----------------------------------------------
    let battery = match EspBatteryProbe::new() {
        Ok(probe) => Some(probe),
        Err(e) => {
            log::error!("Battery ADC unavailable: {}; reporting 0 mV", e);
            None
        }
    };

    // ---- State machine ----------------------------------------------------
    let mut machine = SensorMachine::new(
        imu,
        battery,
        NimbleTransmitter::new(),
        EspDeepSleep,
        SensorTimings::default(),
    );
    machine.run()
}
