use std::{fmt, sync::Arc, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    SpinPolicy,
    mutex::{Mutex, MutexGuard},
};
use crate::{DEFAULT_EPOCH, Error, NodeId, Result, SnowflakeId, SystemClock, TimeSource};

/// The mutable part of an allocator: the last issued millisecond and the
/// sequence used within it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AllocatorState {
    /// Unix milliseconds of the last issued ID, `None` before the first one.
    pub last_timestamp: Option<u64>,
    /// Sequence of the last issued ID within `last_timestamp`.
    pub sequence: u64,
}

/// A lock-based Snowflake ID allocator for one `(datacenter, worker)` node.
///
/// The clock read, the comparison against the last issued timestamp, the
/// sequence update and the bit packing all happen under a single mutex, so
/// IDs are strictly increasing across every thread sharing the allocator.
/// Clones share the same state.
///
/// ## Guarantees
/// - Strictly increasing IDs for the lifetime of the allocator
/// - No collisions with allocators on other nodes sharing the epoch
/// - A wall clock moving backwards is reported as
///   [`Error::ClockRegression`], never papered over
///
/// # Example
/// ```
/// use snowkey::IdAllocator;
///
/// let allocator = IdAllocator::new(1, 2).unwrap();
///
/// let first = allocator.allocate().unwrap();
/// let second = allocator.allocate().unwrap();
/// assert!(first < second);
/// ```
#[derive(Clone)]
pub struct IdAllocator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<AllocatorState>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<AllocatorState>>,
    node: NodeId,
    epoch_millis: u64,
    policy: SpinPolicy,
    time: T,
}

impl IdAllocator<SystemClock> {
    /// Creates an allocator for the given node using the system wall clock and
    /// [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `worker_id` or
    /// `datacenter_id` is greater than 31.
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self> {
        Self::with_clock(worker_id, datacenter_id, SystemClock)
    }
}

impl<T> IdAllocator<T>
where
    T: TimeSource,
{
    /// Creates an allocator reading time from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `worker_id` or
    /// `datacenter_id` is greater than 31.
    pub fn with_clock(worker_id: u64, datacenter_id: u64, time: T) -> Result<Self> {
        Ok(Self::from_node(NodeId::new(worker_id, datacenter_id)?, time))
    }

    /// Creates an allocator for an already validated node.
    pub fn from_node(node: NodeId, time: T) -> Self {
        Self {
            state: Self::new_state(AllocatorState::default()),
            node,
            epoch_millis: DEFAULT_EPOCH.as_millis() as u64,
            policy: SpinPolicy::default(),
            time,
        }
    }

    /// Replaces the epoch that timestamps are measured from.
    ///
    /// Every node sharing an ID space must use the same epoch. The 41-bit
    /// timestamp field covers roughly 69 years from it.
    ///
    /// IDs under different epochs are not comparable, so the returned
    /// allocator starts from fresh state and no longer shares it with clones
    /// of `self`. Call it before [`Self::resume_from`].
    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch_millis = epoch.as_millis() as u64;
        self.state = Self::new_state(AllocatorState::default());
        self
    }

    /// Replaces the policy applied when a millisecond's sequence runs out.
    #[must_use]
    pub fn with_spin_policy(mut self, policy: SpinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seeds the allocator with the timestamp (Unix milliseconds) of the last
    /// ID a previous run issued.
    ///
    /// The whole millisecond is treated as used: the next ID is issued no
    /// earlier than `last_timestamp + 1`, and a clock still behind
    /// `last_timestamp` is reported as [`Error::ClockRegression`]. This
    /// carries regression detection across restarts.
    ///
    /// The returned allocator no longer shares state with clones of `self`.
    #[must_use]
    pub fn resume_from(mut self, last_timestamp: u64) -> Self {
        self.state = Self::new_state(AllocatorState {
            last_timestamp: Some(last_timestamp),
            sequence: SnowflakeId::SEQUENCE_MASK,
        });
        self
    }

    /// The `(datacenter, worker)` pair packed into every ID.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Offset from the Unix epoch that timestamps are measured from.
    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }

    /// What [`Self::allocate`] does when a millisecond's sequence runs out.
    pub fn spin_policy(&self) -> SpinPolicy {
        self.policy
    }

    /// Returns a copy of the current mutable state.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if the lock has been poisoned (std
    ///   mutex only).
    pub fn snapshot(&self) -> Result<AllocatorState> {
        Ok(*self.lock()?)
    }

    /// Allocates the next ID as a plain integer.
    ///
    /// The value is always non-negative when viewed as an `i64`.
    ///
    /// # Errors
    ///
    /// See [`Self::allocate_id`].
    pub fn allocate(&self) -> Result<u64> {
        self.allocate_id().map(|id| id.to_raw())
    }

    /// Allocates the next ID.
    ///
    /// If the current millisecond already used all 4096 sequence values, the
    /// call spins under the lock until the clock advances, subject to the
    /// configured [`SpinPolicy`].
    ///
    /// On error the allocator state is unchanged.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued timestamp
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the epoch
    /// - [`Error::ClockStalled`] if the spin budget of
    ///   [`SpinPolicy::Bounded`] ran out
    /// - [`Error::LockPoisoned`] if the lock has been poisoned (std mutex
    ///   only)
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node = %self.node))
    )]
    pub fn allocate_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;

        let now = self.time.current_millis();
        let next = self.advance(*state, now)?;
        *state = next;

        Ok(self.compose(&next))
    }

    fn advance(&self, state: AllocatorState, now: u64) -> Result<AllocatorState> {
        // A regression is reported as such even when it also lands before the
        // epoch.
        if let Some(last) = state.last_timestamp.filter(|&last| now < last) {
            return Err(Self::cold_clock_behind(now, last));
        }
        if now < self.epoch_millis {
            return Err(Self::cold_before_epoch(now, self.epoch_millis));
        }

        match state.last_timestamp {
            Some(last) if now == last => {
                let sequence = (state.sequence + 1) & SnowflakeId::SEQUENCE_MASK;
                let now = if sequence == 0 {
                    self.wait_past(last)?
                } else {
                    now
                };
                Ok(AllocatorState {
                    last_timestamp: Some(now),
                    sequence,
                })
            }
            _ => Ok(AllocatorState {
                last_timestamp: Some(now),
                sequence: 0,
            }),
        }
    }

    /// Samples the clock until it reads past `last`.
    fn wait_past(&self, last: u64) -> Result<u64> {
        let mut spins: u32 = 0;
        loop {
            let now = self.time.current_millis();
            if now > last {
                return Ok(now);
            }

            spins = spins.saturating_add(1);
            if self.policy.is_exhausted(spins) {
                return Err(Self::cold_stalled(spins));
            }
            core::hint::spin_loop();
        }
    }

    fn compose(&self, state: &AllocatorState) -> SnowflakeId {
        // `advance` only produces states with a timestamp at or after the epoch
        let timestamp = state.last_timestamp.unwrap_or(self.epoch_millis) - self.epoch_millis;
        SnowflakeId::from_components(
            timestamp,
            self.node.datacenter_id(),
            self.node.worker_id(),
            state.sequence,
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, AllocatorState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    #[cfg(feature = "cache-padded")]
    fn new_state(
        state: AllocatorState,
    ) -> Arc<crossbeam_utils::CachePadded<Mutex<AllocatorState>>> {
        Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(state)))
    }

    #[cfg(not(feature = "cache-padded"))]
    fn new_state(state: AllocatorState) -> Arc<Mutex<AllocatorState>> {
        Arc::new(Mutex::new(state))
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last_timestamp: u64) -> Error {
        let behind_by = last_timestamp - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            behind_by,
            last_timestamp,
            "clock moved backwards, refusing to allocate"
        );
        Error::ClockRegression {
            behind_by,
            last_timestamp,
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_before_epoch(now: u64, epoch: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(now, epoch, "clock reads earlier than the epoch");
        Error::ClockBeforeEpoch { now, epoch }
    }

    #[cold]
    #[inline(never)]
    fn cold_stalled(spins: u32) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(spins, "sequence exhausted and clock did not advance");
        Error::ClockStalled { spins }
    }
}

impl<T> fmt::Debug for IdAllocator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAllocator")
            .field("node", &self.node)
            .field("epoch_millis", &self.epoch_millis)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
