// Activity Gauge — Shared Device Configuration
// Targets: Seeed Studio Xiao ESP32-C3 (sensor tag + display meter)

use std::time::Duration;

// ---------------------------------------------------------------------------
// BLE Identifiers (compiled into both devices; matching is by service UUID)
// ---------------------------------------------------------------------------
pub const BLE_SERVICE_UUID: &str = "6f7f0001-8f3b-4c3a-a39a-3f8ec4dca101";
pub const BLE_CHAR_UUID: &str = "6f7f0002-8f3b-4c3a-a39a-3f8ec4dca101";

/// Advertised names are diagnostic only — discovery never matches on them.
pub const SENSOR_DEVICE_NAME: &str = "ACTIVITY-TAG";
pub const DISPLAY_DEVICE_NAME: &str = "ACTIVITY-METER";

// ---------------------------------------------------------------------------
// GPIO Pin Assignments (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
// Sensor tag
pub const PIN_I2C_SDA: i32 = 6;     // D4 — I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5 — I2C clock line
pub const PIN_BATTERY_ADC: u32 = 2; // D0/A0 — Battery voltage (ADC)

// Display meter
pub const PIN_MOTOR_IN1: i32 = 2; // D0 — stepper coil A+
pub const PIN_MOTOR_IN2: i32 = 3; // D1 — stepper coil A-
pub const PIN_MOTOR_IN3: i32 = 4; // D2 — stepper coil B+
pub const PIN_MOTOR_IN4: i32 = 5; // D3 — stepper coil B-
pub const PIN_STATUS_LED: i32 = 20; // D7 — activity threshold LED

// ---------------------------------------------------------------------------
// Sensor Tag Timing
// ---------------------------------------------------------------------------
pub const IMU_SAMPLE_WINDOW_MS: u64 = 1500;
pub const IMU_SAMPLE_PERIOD_MS: u64 = 40; // ~25 Hz fold rate
pub const IMU_INIT_RETRIES: u32 = 3;
pub const IMU_INIT_BACKOFF_MS: u64 = 100;
pub const SUBSCRIBER_WAIT_TIMEOUT_MS: u64 = 5000;
pub const SUBSCRIBER_WAIT_POLL_MS: u64 = 20;
pub const POST_NOTIFY_SETTLE_MS: u64 = 120;
pub const DEEP_SLEEP_SECONDS: u64 = 30;

// ---------------------------------------------------------------------------
// Display Meter Timing
// ---------------------------------------------------------------------------
pub const BLE_SCAN_WINDOW_MS: u64 = 4000;
pub const SCAN_RETRY_DELAY_MS: u64 = 400;
pub const DATA_WAIT_TIMEOUT_MS: u64 = 8000;
pub const DATA_WAIT_POLL_MS: u64 = 20;
pub const IDLE_DELAY_MS: u64 = 300;

// ---------------------------------------------------------------------------
// Gauge Geometry & Status LED
// ---------------------------------------------------------------------------
pub const GAUGE_MAX_STEPS: i32 = 600;
pub const MOTOR_STEP_DELAY_US: u64 = 1200;
pub const LED_ACTIVITY_THRESHOLD: u16 = 50; // LED on at or above midpoint

// ---------------------------------------------------------------------------
// Activity Estimator
// ---------------------------------------------------------------------------
/// Combined-axis movement (|x|+|y|+|z| average) that maps to score 100.
pub const FULL_SCALE_SUM_G: f32 = 3.0;

// ---------------------------------------------------------------------------
// LSM6DS3 Sensor Bus
// ---------------------------------------------------------------------------
pub const IMU_ADDR_PRIMARY: u8 = 0x6A;
pub const IMU_ADDR_SECONDARY: u8 = 0x6B;
pub const ACCEL_SCALE_2G: f32 = 0.000_061; // g/LSB at ±2 g
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Battery ADC (12-bit @ 3.3 V)
// ---------------------------------------------------------------------------
pub const BATTERY_ADC_MAX: u32 = 4095;
pub const BATTERY_FULL_SCALE_MV: u32 = 3300;

// ---------------------------------------------------------------------------
// Per-machine timing bundles. The state machines carry these in their
// context so host tests can run the same code with millisecond timeouts.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SensorTimings {
    pub sample_window: Duration,
    pub sample_period: Duration,
    pub init_retries: u32,
    pub init_backoff: Duration,
    pub subscriber_timeout: Duration,
    pub subscriber_poll: Duration,
    pub settle_delay: Duration,
    pub deep_sleep: Duration,
}

impl Default for SensorTimings {
    fn default() -> Self {
        Self {
            sample_window: Duration::from_millis(IMU_SAMPLE_WINDOW_MS),
            sample_period: Duration::from_millis(IMU_SAMPLE_PERIOD_MS),
            init_retries: IMU_INIT_RETRIES,
            init_backoff: Duration::from_millis(IMU_INIT_BACKOFF_MS),
            subscriber_timeout: Duration::from_millis(SUBSCRIBER_WAIT_TIMEOUT_MS),
            subscriber_poll: Duration::from_millis(SUBSCRIBER_WAIT_POLL_MS),
            settle_delay: Duration::from_millis(POST_NOTIFY_SETTLE_MS),
            deep_sleep: Duration::from_secs(DEEP_SLEEP_SECONDS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayTimings {
    pub scan_window: Duration,
    pub scan_retry_delay: Duration,
    pub data_wait_timeout: Duration,
    pub data_wait_poll: Duration,
    pub idle_delay: Duration,
}

impl Default for DisplayTimings {
    fn default() -> Self {
        Self {
            scan_window: Duration::from_millis(BLE_SCAN_WINDOW_MS),
            scan_retry_delay: Duration::from_millis(SCAN_RETRY_DELAY_MS),
            data_wait_timeout: Duration::from_millis(DATA_WAIT_TIMEOUT_MS),
            data_wait_poll: Duration::from_millis(DATA_WAIT_POLL_MS),
            idle_delay: Duration::from_millis(IDLE_DELAY_MS),
        }
    }
}
