use core::fmt;

use crate::{Error, Result, SnowflakeId};

/// The `(datacenter_id, worker_id)` pair identifying one allocator in a
/// deployment.
///
/// Both halves are 5 bits wide, giving 32 datacenters of 32 workers each.
/// Every running allocator sharing an epoch must own a distinct pair; the
/// assignment itself (environment, config management) is up to the caller.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawNodeId"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    datacenter_id: u64,
    worker_id: u64,
}

impl NodeId {
    /// Largest accepted worker ID.
    pub const MAX_WORKER_ID: u64 = SnowflakeId::WORKER_ID_MASK;

    /// Largest accepted datacenter ID.
    pub const MAX_DATACENTER_ID: u64 = SnowflakeId::DATACENTER_ID_MASK;

    /// Validates and builds a node identifier.
    ///
    /// The argument order (worker first) matches [`IdAllocator::new`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first parameter
    /// outside `0..=31`.
    ///
    /// # Example
    ///
    /// ```
    /// use snowkey::NodeId;
    ///
    /// let node = NodeId::new(3, 7).unwrap();
    /// assert_eq!(node.worker_id(), 3);
    /// assert_eq!(node.datacenter_id(), 7);
    /// assert!(NodeId::new(32, 0).is_err());
    /// ```
    ///
    /// [`IdAllocator::new`]: crate::IdAllocator::new
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self> {
        if worker_id > Self::MAX_WORKER_ID {
            return Err(Error::InvalidConfiguration {
                parameter: "worker_id",
                value: worker_id,
                max: Self::MAX_WORKER_ID,
            });
        }
        if datacenter_id > Self::MAX_DATACENTER_ID {
            return Err(Error::InvalidConfiguration {
                parameter: "datacenter_id",
                value: datacenter_id,
                max: Self::MAX_DATACENTER_ID,
            });
        }
        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// Builds a node from fields already known to be in range, e.g. decoded
    /// from an ID.
    pub(crate) const fn from_masked(worker_id: u64, datacenter_id: u64) -> Self {
        Self {
            datacenter_id,
            worker_id,
        }
    }
}

/// Unvalidated wire form of [`NodeId`]; deserialization goes through
/// [`NodeId::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawNodeId {
    datacenter_id: u64,
    worker_id: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawNodeId> for NodeId {
    type Error = Error;

    fn try_from(raw: RawNodeId) -> Result<Self> {
        Self::new(raw.worker_id, raw.datacenter_id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dc{}/w{}", self.datacenter_id, self.worker_id)
    }
}
