// Activity Gauge — Display Meter State Machine
//
//   Boot → ScanConnect → WaitForData ⇄ UpdateDisplay
//                              ↓ (silence)        ↑
//                            Idle ────────────────┘
//
// Link loss from any waiting state falls back to ScanConnect; prolonged
// silence on a healthy link parks the machine in Idle without moving the
// gauge — the last commanded position means "no new data", not "zero
// activity". Each step() call advances at most one transition; WaitForData
// additionally sleeps one poll tick when nothing has happened yet.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::config::DisplayTimings;
use crate::drivers::gauge::MotorGauge;
use crate::drivers::led::StatusLed;
use crate::hal::{DigitalOut, DisplayCapabilities};
use crate::link::{Connection, SensorLink};
use crate::mailbox::PayloadMailbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Boot,
    ScanConnect,
    WaitForData,
    UpdateDisplay,
    Idle,
}

pub struct DisplayMachine<L, P>
where
    L: SensorLink,
    P: DigitalOut,
{
    state: DisplayState,
    timings: DisplayTimings,
    caps: DisplayCapabilities,

    link: L,
    conn: Option<L::Connection>,
    mailbox: Arc<PayloadMailbox>,

    gauge: MotorGauge<P>,
    led: StatusLed<P>,

    /// Start of the current WaitForData stint; reset on every entry.
    wait_started: Instant,
}

impl<L, P> DisplayMachine<L, P>
where
    L: SensorLink,
    P: DigitalOut,
{
    pub fn new(
        link: L,
        mailbox: Arc<PayloadMailbox>,
        gauge: MotorGauge<P>,
        led: StatusLed<P>,
        timings: DisplayTimings,
    ) -> Self {
        Self {
            state: DisplayState::Boot,
            timings,
            caps: DisplayCapabilities::default(),
            link,
            conn: None,
            mailbox,
            gauge,
            led,
            wait_started: Instant::now(),
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn capabilities(&self) -> DisplayCapabilities {
        self.caps
    }

    pub fn gauge_position(&self) -> i32 {
        self.gauge.position()
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Advance one state transition (or one poll tick in WaitForData).
    pub fn step(&mut self) {
        match self.state {
            DisplayState::Boot => self.on_boot(),
            DisplayState::ScanConnect => self.on_scan_connect(),
            DisplayState::WaitForData => self.on_wait_for_data(),
            DisplayState::UpdateDisplay => self.on_update_display(),
            DisplayState::Idle => self.on_idle(),
        }
    }

    fn on_boot(&mut self) {
        log::info!("[stage] boot");
        self.caps = DisplayCapabilities {
            gauge: self.gauge.is_ready(),
            status_led: self.led.is_ready(),
        };
        if !self.caps.gauge {
            log::error!("Gauge pins not configured; display updates will be log-only");
        }
        self.state = DisplayState::ScanConnect;
    }

    fn on_scan_connect(&mut self) {
        log::info!("[stage] scanning");
        match self.link.discover(self.timings.scan_window) {
            Ok(conn) => {
                log::info!("[stage] link up");
                self.conn = Some(conn);
                self.enter_wait();
            }
            Err(e) => {
                // Every sub-step failure lands here and is handled the
                // same way: abandon the attempt, pause, rescan.
                log::warn!("Link attempt failed: {}; retrying", e);
                thread::sleep(self.timings.scan_retry_delay);
            }
        }
    }

    fn on_wait_for_data(&mut self) {
        if !self.link_alive() {
            log::warn!("Link lost; rediscovering");
            self.drop_link();
            self.state = DisplayState::ScanConnect;
            return;
        }

        if self.mailbox.is_ready() {
            self.state = DisplayState::UpdateDisplay;
            return;
        }

        if self.wait_started.elapsed() > self.timings.data_wait_timeout {
            self.state = DisplayState::Idle;
            return;
        }

        thread::sleep(self.timings.data_wait_poll);
    }

    fn on_update_display(&mut self) {
        if let Some(payload) = self.mailbox.take() {
            // The sender is trusted but not fully: clamp before the value
            // reaches the actuator.
            let activity = payload.activity.min(100);
            log::info!(
                "RX seq={} activity={} battery_mv={}",
                payload.sequence,
                activity,
                payload.battery_millivolts
            );

            self.gauge.set_target_from_activity(activity);
            self.led.set_from_activity(activity);
        }
        self.enter_wait();
    }

    fn on_idle(&mut self) {
        log::info!("[stage] idle");
        thread::sleep(self.timings.idle_delay);
        if self.link_alive() {
            self.enter_wait();
        } else {
            self.drop_link();
            self.state = DisplayState::ScanConnect;
        }
    }

    fn enter_wait(&mut self) {
        self.wait_started = Instant::now();
        self.state = DisplayState::WaitForData;
    }

    fn link_alive(&self) -> bool {
        self.conn.as_ref().map_or(false, Connection::is_connected)
    }

    fn drop_link(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.disconnect();
        }
    }
}
