pub mod clock;
pub mod error;
pub mod timeunit;

pub use self::clock::{Clock, ManualClock, MonotonicClock};

/// Milliseconds with sub-millisecond precision, the unit every report column uses.
#[inline]
pub fn as_millis_f64(duration: std::time::Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_nanos()) / 1_000_000.0
}
