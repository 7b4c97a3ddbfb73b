// Activity Gauge — LSM6DS3 IMU Driver
//
// Register-level driver over the generic register-bus capability, so the
// same code runs against the ESP-IDF I2C bus and against a scripted fake
// in host tests.

use crate::activity::AccelSample;
use crate::config::{ACCEL_SCALE_2G, IMU_ADDR_PRIMARY, IMU_ADDR_SECONDARY};
use crate::hal::RegisterBus;

// LSM6DS3 register addresses
const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1_XL: u8 = 0x10;
const REG_OUTX_L_XL: u8 = 0x28; // start of 6-byte accel burst
const WHO_AM_I_EXPECTED: u8 = 0x69;

// ODR = 416 Hz, FS = ±2 g
const CTRL1_XL_CONFIG: u8 = 0x60;

pub struct Lsm6ds3<B: RegisterBus> {
    bus: B,
    addr: u8,
}

impl<B: RegisterBus> Lsm6ds3<B> {
    pub fn new(bus: B) -> Self {
        Self { bus, addr: IMU_ADDR_PRIMARY }
    }

    /// Probe both known bus addresses, verify identity, configure the
    /// accelerometer. One failed attempt here is transient — the sensor
    /// machine wraps this in its bounded retry.
    pub fn init(&mut self) -> anyhow::Result<()> {
        if !self.probe(IMU_ADDR_PRIMARY) && !self.probe(IMU_ADDR_SECONDARY) {
            anyhow::bail!("LSM6DS3 not found at 0x6A or 0x6B");
        }
        self.bus.write_reg(self.addr, REG_CTRL1_XL, CTRL1_XL_CONFIG)?;
        Ok(())
    }

    /// Burst-read the three accelerometer axes and convert to g.
    pub fn read_accel(&mut self) -> anyhow::Result<AccelSample> {
        let mut raw = [0u8; 6];
        self.bus.read_regs(self.addr, REG_OUTX_L_XL, &mut raw)?;

        Ok(AccelSample {
            ax_g: i16::from_le_bytes([raw[0], raw[1]]) as f32 * ACCEL_SCALE_2G,
            ay_g: i16::from_le_bytes([raw[2], raw[3]]) as f32 * ACCEL_SCALE_2G,
            az_g: i16::from_le_bytes([raw[4], raw[5]]) as f32 * ACCEL_SCALE_2G,
        })
    }

    fn probe(&mut self, addr: u8) -> bool {
        self.addr = addr;
        let mut whoami = [0u8; 1];
        match self.bus.read_regs(addr, REG_WHO_AM_I, &mut whoami) {
            Ok(()) => whoami[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }
}
