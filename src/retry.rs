// Activity Gauge — Bounded Retry
//
// One combinator for every retry-with-backoff site (sensor bring-up and
// friends) instead of per-site loop-and-flag code.

use std::thread;
use std::time::Duration;

/// Run `op` up to `attempts` times, sleeping `backoff` between failures.
/// Returns the first `Ok`, or the last `Err` once the attempts are spent.
/// `attempts` must be at least 1.
pub fn retry<T, E, F>(attempts: u32, backoff: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    debug_assert!(attempts > 0);
    let mut tries = attempts.max(1);
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                tries -= 1;
                if tries == 0 {
                    return Err(e);
                }
                thread::sleep(backoff);
            }
        }
    }
}
