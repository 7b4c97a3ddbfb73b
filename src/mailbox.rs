// Activity Gauge — Payload Mailbox
//
// Single-slot hand-off between the radio stack's notification delivery and
// the display state machine: last message wins, no queueing. The radio
// callback is the only writer, the main loop the only reader and the only
// clearer of the ready flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::protocol::ActivityPayload;

#[derive(Debug, Default)]
pub struct PayloadMailbox {
    slot: Mutex<ActivityPayload>,
    ready: AtomicBool,
}

impl PayloadMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit a decoded payload, replacing any unread one.
    pub fn post(&self, payload: ActivityPayload) {
        // Slot first, flag second: a reader that observes the flag set is
        // guaranteed to see at least this payload.
        *self.slot.lock().unwrap() = payload;
        self.ready.store(true, Ordering::Release);
    }

    /// Decode raw notification bytes and deposit on success. A truncated
    /// message is discarded here, at the protocol boundary — it never
    /// reaches the state machine.
    pub fn post_encoded(&self, bytes: &[u8]) {
        match ActivityPayload::decode(bytes) {
            Ok(payload) => self.post(payload),
            Err(e) => log::warn!("Dropping malformed notification: {}", e),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Consume the most recent payload, clearing the ready flag.
    pub fn take(&self) -> Option<ActivityPayload> {
        if self.ready.swap(false, Ordering::AcqRel) {
            Some(*self.slot.lock().unwrap())
        } else {
            None
        }
    }
}
