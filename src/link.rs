// Activity Gauge — Radio Capability Interfaces
//
// The sensor tag drives a transmitter role (advertise, wait for one
// subscriber, push one notification, tear down). The display meter drives
// a scanner role that yields a live connection handle and feeds decoded
// notifications into the payload mailbox it was built with.
//
// Every sub-step failure on the display side is handled uniformly —
// abandon the attempt, pause, rescan — so callers only ever observe
// "discovery failed", never a per-variant recovery path. The variants
// exist for the log line.

use thiserror::Error;

use std::time::Duration;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("scan finished without a matching advertisement")]
    NotFound,
    #[error("connect attempt refused by peer")]
    ConnectFailed,
    #[error("service or characteristic missing on peer")]
    ServiceMissing,
    #[error("peer characteristic does not support notifications")]
    NotifyUnsupported,
    #[error("notification subscription refused")]
    SubscribeFailed,
    #[error("radio stack error: {0}")]
    Radio(String),
}

/// Sensor-side radio role. The machine owns the bounded wait loop; the
/// implementation only reports whether a peer is currently attached.
pub trait Transmitter {
    /// Bring the radio up: GATT server, notify characteristic,
    /// advertising with the shared service UUID.
    fn start_advertising(&mut self) -> Result<(), LinkError>;

    /// True while at least one peer is connected to the server.
    fn subscriber_attached(&mut self) -> bool;

    /// Push one encoded payload to the attached subscriber.
    fn notify(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Tear the radio down completely. Must be safe to call on every exit
    /// path, including after a failed `start_advertising`.
    fn shutdown(&mut self);
}

/// A live subscription to the sensor's notify characteristic. Exists only
/// between a successful `discover` and the disconnect that ends it.
pub trait Connection {
    fn is_connected(&self) -> bool;
    fn disconnect(&mut self);
}

/// Display-side discovery role: scan for the advertised service, connect,
/// resolve the characteristic, subscribe. Decoded notifications are
/// delivered out-of-band into the mailbox the implementation was
/// constructed with.
pub trait SensorLink {
    type Connection: Connection;

    fn discover(&mut self, scan_window: Duration) -> Result<Self::Connection, LinkError>;
}
