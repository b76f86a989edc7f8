//! A process-wide allocator.
//!
//! Most services want exactly one allocator per node, created at startup from
//! configuration and reached from request handlers without threading it
//! through every call. This module holds that instance.
//!
//! ```
//! snowkey::global::init(3, 1).unwrap();
//!
//! let id = snowkey::global::next_id().unwrap();
//! assert!(id > 0);
//! ```

use std::sync::OnceLock;

use crate::{Error, IdAllocator, Result};

static ALLOCATOR: OnceLock<IdAllocator> = OnceLock::new();

/// Installs a system-clock allocator for the given node.
///
/// # Errors
///
/// - [`Error::InvalidConfiguration`] if either ID is out of range
/// - [`Error::AlreadyInitialized`] if an allocator is already installed
pub fn init(worker_id: u64, datacenter_id: u64) -> Result<()> {
    install(IdAllocator::new(worker_id, datacenter_id)?)
}

/// Installs a preconfigured allocator, e.g. one with a custom epoch or spin
/// policy.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if an allocator is already
/// installed. The existing one is kept.
pub fn install(allocator: IdAllocator) -> Result<()> {
    #[cfg(feature = "tracing")]
    let node = allocator.node();

    ALLOCATOR
        .set(allocator)
        .map_err(|_| Error::AlreadyInitialized)?;

    #[cfg(feature = "tracing")]
    tracing::info!(%node, "installed global id allocator");
    Ok(())
}

/// Returns the installed allocator.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before [`init`] or [`install`].
pub fn get() -> Result<&'static IdAllocator> {
    ALLOCATOR.get().ok_or(Error::NotInitialized)
}

/// Allocates the next ID from the installed allocator.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before [`init`] or [`install`], or any
/// error from [`IdAllocator::allocate`].
pub fn next_id() -> Result<u64> {
    get()?.allocate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // The global is shared by every test in this binary, so everything that
    // touches it lives in this one test.
    #[test]
    fn lifecycle() {
        assert_eq!(next_id(), Err(Error::NotInitialized));
        assert!(matches!(
            init(32, 0),
            Err(Error::InvalidConfiguration {
                parameter: "worker_id",
                ..
            })
        ));
        assert_eq!(next_id(), Err(Error::NotInitialized));

        init(5, 9).unwrap();
        assert_eq!(init(1, 1), Err(Error::AlreadyInitialized));
        assert_eq!(
            install(IdAllocator::new(2, 2).unwrap()),
            Err(Error::AlreadyInitialized)
        );

        let node = get().unwrap().node();
        assert_eq!(node.worker_id(), 5);
        assert_eq!(node.datacenter_id(), 9);

        let mut seen = HashSet::new();
        let mut last = 0;
        for _ in 0..10_000 {
            let id = next_id().unwrap();
            assert!(id > last);
            assert!(seen.insert(id));
            last = id;
        }
    }
}
