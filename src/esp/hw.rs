// Activity Gauge — ESP-IDF GPIO / I2C / ADC / Sleep Bindings

use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::i2c::I2cDriver;

use crate::config::I2C_TIMEOUT_TICKS;
use crate::hal::{adc_raw_to_millivolts, BatteryProbe, DeepSleep, DigitalOut, RegisterBus};

// ---------------------------------------------------------------------------
// I2C register bus
// ---------------------------------------------------------------------------

pub struct I2cRegisterBus {
    i2c: I2cDriver<'static>,
}

impl I2cRegisterBus {
    pub fn new(i2c: I2cDriver<'static>) -> Self {
        Self { i2c }
    }
}

impl RegisterBus for I2cRegisterBus {
    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> anyhow::Result<()> {
        self.i2c.write(addr, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn read_regs(&mut self, addr: u8, reg: u8, out: &mut [u8]) -> anyhow::Result<()> {
        self.i2c.write_read(addr, &[reg], out, I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GPIO output pin
// ---------------------------------------------------------------------------

pub struct EspPin {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl EspPin {
    pub fn new(pin: PinDriver<'static, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }
}

impl DigitalOut for EspPin {
    fn write(&mut self, high: bool) {
        let _ = if high { self.pin.set_high() } else { self.pin.set_low() };
    }
}

// ---------------------------------------------------------------------------
// Battery ADC (oneshot driver, GPIO2 / ADC1 channel 2, 11 dB attenuation)
// ---------------------------------------------------------------------------

pub struct EspBatteryProbe {
    handle: esp_idf_sys::adc_oneshot_unit_handle_t,
    channel: esp_idf_sys::adc_channel_t,
}

impl EspBatteryProbe {
    pub fn new() -> anyhow::Result<Self> {
        unsafe {
            let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
            let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
                unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            let ret = esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut handle);
            anyhow::ensure!(ret == esp_idf_sys::ESP_OK, "ADC unit init failed ({})", ret);

            let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
                atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            let channel = esp_idf_sys::adc_channel_t_ADC_CHANNEL_2; // GPIO2
            let ret = esp_idf_sys::adc_oneshot_config_channel(handle, channel, &chan_cfg);
            anyhow::ensure!(ret == esp_idf_sys::ESP_OK, "ADC channel config failed ({})", ret);

            Ok(Self { handle, channel })
        }
    }
}

impl BatteryProbe for EspBatteryProbe {
    fn read_millivolts(&mut self) -> Option<u16> {
        let mut raw: i32 = 0;
        let ret = unsafe { esp_idf_sys::adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret == esp_idf_sys::ESP_OK {
            Some(adc_raw_to_millivolts(raw as u16))
        } else {
            log::warn!("Battery ADC read failed ({})", ret);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Timer deep sleep
// ---------------------------------------------------------------------------

/// Timer-based deep suspension. `sleep` does not return: the chip resets
/// and the firmware re-enters through `main`, which is the Boot path.
pub struct EspDeepSleep;

impl DeepSleep for EspDeepSleep {
    fn sleep(&mut self, duration: Duration) {
        unsafe {
            esp_idf_sys::esp_sleep_enable_timer_wakeup(duration.as_micros() as u64);
            esp_idf_sys::esp_deep_sleep_start();
        }
    }
}
