// Activity Gauge — Wire Protocol
//
// Fixed 8-byte notification payload exchanged between the sensor tag and
// the display meter. Little-endian, no padding, field order
// `sequence | activity | battery_millivolts`. Both ends are built from the
// same protocol revision; there is no version or integrity field.

use thiserror::Error;

/// Encoded size of an [`ActivityPayload`] on the wire.
pub const PAYLOAD_LEN: usize = 8;

/// One telemetry record: cycle counter, bounded activity score, battery
/// level. `activity` is nominally in `[0, 100]` but receivers clamp it
/// again before acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityPayload {
    pub sequence: u32,
    pub activity: u16,
    pub battery_millivolts: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload truncated: got {got} of {} bytes", PAYLOAD_LEN)]
    Truncated { got: usize },
}

impl ActivityPayload {
    /// Serialize to the fixed wire layout.
    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[0..4].copy_from_slice(&self.sequence.to_le_bytes());
        buf[4..6].copy_from_slice(&self.activity.to_le_bytes());
        buf[6..8].copy_from_slice(&self.battery_millivolts.to_le_bytes());
        buf
    }

    /// Deserialize from a received notification. Anything shorter than
    /// [`PAYLOAD_LEN`] is rejected whole — never partially decoded.
    /// Trailing bytes beyond the fixed layout are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < PAYLOAD_LEN {
            return Err(DecodeError::Truncated { got: bytes.len() });
        }
        Ok(Self {
            sequence: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            activity: u16::from_le_bytes([bytes[4], bytes[5]]),
            battery_millivolts: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }
}
