use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Default epoch: Thursday, January 1, 2015 00:00:00 UTC+8
/// (`1_420_041_600_000` ms since the Unix epoch).
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_420_041_600_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests. Readings are absolute; the allocator subtracts its own
/// epoch when packing an ID.
///
/// # Example
///
/// ```
/// use snowkey::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_420_041_600_001
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_420_041_600_001);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The operating system's wall clock.
///
/// Unlike a monotonic timer this follows NTP corrections and manual
/// adjustments, which is exactly what lets the allocator detect a clock that
/// moved backwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock before 1970 reads as 0, which the allocator reports as
        // `ClockBeforeEpoch`.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
