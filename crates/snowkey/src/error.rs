//! Error types for ID allocation.
//!
//! Allocation has exactly two failure modes that callers are expected to
//! handle: a node configured outside the 5-bit field ranges, and a wall clock
//! that moved backwards. The remaining variants only surface under specific
//! configurations (bounded spinning, the std mutex, the process-wide
//! allocator).

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `snowkey` can emit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A node identifier does not fit its bit field.
    #[error("{parameter} must be between 0 and {max}, got {value}")]
    InvalidConfiguration {
        /// Which parameter was rejected (`worker_id` or `datacenter_id`).
        parameter: &'static str,
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// The wall clock reads earlier than the last issued timestamp.
    ///
    /// The allocator refuses to issue IDs until the clock catches up. It is
    /// never retried internally.
    #[error(
        "clock moved backwards, refusing to generate id for {behind_by} milliseconds (last issued at {last_timestamp})"
    )]
    ClockRegression {
        /// How far behind the clock is, in milliseconds.
        behind_by: u64,
        /// The last timestamp (Unix milliseconds) an ID was issued for.
        last_timestamp: u64,
    },

    /// The wall clock reads earlier than the configured epoch.
    #[error("clock reads {now} ms which is before the epoch at {epoch} ms")]
    ClockBeforeEpoch {
        /// Current clock reading in Unix milliseconds.
        now: u64,
        /// Configured epoch in Unix milliseconds.
        epoch: u64,
    },

    /// The sequence was exhausted and the clock did not advance within the
    /// configured spin budget. Only produced by [`SpinPolicy::Bounded`].
    ///
    /// [`SpinPolicy::Bounded`]: crate::SpinPolicy::Bounded
    #[error("clock did not advance after {spins} samples with the sequence exhausted")]
    ClockStalled {
        /// Number of clock samples taken before giving up.
        spins: u32,
    },

    /// The allocator lock was poisoned by a panicking thread.
    ///
    /// `parking_lot` mutexes do not poison, so this variant only exists with
    /// the std mutex.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("allocator lock poisoned")]
    LockPoisoned,

    /// The process-wide allocator was already installed.
    #[error("global allocator already initialized")]
    AlreadyInitialized,

    /// The process-wide allocator was used before being installed.
    #[error("global allocator not initialized")]
    NotInitialized,
}

#[cfg(not(feature = "parking-lot"))]
use std::sync::{MutexGuard, PoisonError};

// Convert all poisoned lock errors to a simplified `LockPoisoned`
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
