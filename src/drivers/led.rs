// Activity Gauge — Status LED Driver
//
// Binary indicator driven from the activity score alone: on at or above
// the midpoint, off below it. Independent of gauge readiness.

use crate::config::LED_ACTIVITY_THRESHOLD;
use crate::hal::DigitalOut;

pub struct StatusLed<P: DigitalOut> {
    pin: Option<P>,
}

impl<P: DigitalOut> StatusLed<P> {
    pub fn new(mut pin: Option<P>) -> Self {
        if let Some(pin) = pin.as_mut() {
            pin.write(false);
        }
        Self { pin }
    }

    pub fn is_ready(&self) -> bool {
        self.pin.is_some()
    }

    pub fn set_from_activity(&mut self, activity: u16) {
        if let Some(pin) = self.pin.as_mut() {
            pin.write(activity >= LED_ACTIVITY_THRESHOLD);
        }
    }
}
