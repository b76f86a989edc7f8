//! Snowflake-style 64-bit primary key allocation.
//!
//! Each node owns an [`IdAllocator`] configured with a 5-bit datacenter ID and
//! a 5-bit worker ID. Allocated IDs pack, from most to least significant bit:
//!
//! - 1 reserved bit (always zero, so IDs are non-negative as `i64`)
//! - 41 bits of milliseconds since the epoch ([`DEFAULT_EPOCH`] unless
//!   configured)
//! - 5 bits datacenter ID
//! - 5 bits worker ID
//! - 12 bits sequence within the millisecond
//!
//! IDs from one allocator are strictly increasing. IDs from allocators with
//! distinct `(datacenter, worker)` pairs never collide.
//!
//! ```
//! use snowkey::{IdAllocator, SnowflakeId};
//!
//! let allocator = IdAllocator::new(7, 19).unwrap();
//! let id = SnowflakeId::from_raw(allocator.allocate().unwrap());
//!
//! assert_eq!(id.worker_id(), 7);
//! assert_eq!(id.datacenter_id(), 19);
//! ```
//!
//! ## Features
//!
//! - `parking-lot`: guard allocator state with `parking_lot::Mutex` instead of
//!   the std mutex (no lock poisoning).
//! - `cache-padded`: pad the shared state to a cache line.
//! - `tracing`: emit spans for allocation and events for clock faults.
//! - `serde`: serialize [`SnowflakeId`] and [`NodeId`].
#![cfg_attr(docsrs, feature(doc_cfg))]

mod allocator;
mod error;
pub mod global;
mod id;
mod node;
mod time;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::node::*;
pub use crate::time::*;
