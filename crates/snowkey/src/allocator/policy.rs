/// What the allocator does when all 4096 sequence values of the current
/// millisecond are used up.
///
/// In both cases the wait happens while the allocator lock is held, so every
/// other caller blocks behind it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpinPolicy {
    /// Busy-wait on the clock until it moves past the exhausted millisecond.
    ///
    /// This never fails, but a clock that stops advancing stalls every caller
    /// indefinitely.
    #[default]
    Unbounded,

    /// Busy-wait for at most `max_spins` clock samples, then fail the call
    /// with [`Error::ClockStalled`]. At least one sample is always taken.
    ///
    /// The allocator state is left untouched on failure, so a later call
    /// resumes exactly where the failed one started.
    ///
    /// [`Error::ClockStalled`]: crate::Error::ClockStalled
    Bounded {
        /// Maximum number of clock samples to take while waiting.
        max_spins: u32,
    },
}

impl SpinPolicy {
    /// Returns `true` once `spins` samples have used up the budget.
    pub(crate) const fn is_exhausted(&self, spins: u32) -> bool {
        match *self {
            Self::Unbounded => false,
            Self::Bounded { max_spins } => spins >= max_spins,
        }
    }
}

impl From<Option<u32>> for SpinPolicy {
    fn from(max_spins: Option<u32>) -> Self {
        max_spins.map_or(Self::Unbounded, |max_spins| Self::Bounded { max_spins })
    }
}
