//! Local cache store for offline support.
//!
//! This module provides a persistent, partitioned key-value store:
//! - One partition per entity category (jobs, VHC records, vehicles...)
//! - Upserts keyed by domain identity, stamped with a capture time
//! - Secondary-index lookups (e.g. jobs by owning user)
//! - The queue of mutations captured while offline

mod memory;
mod partition;
mod storage;
mod traits;

pub use memory::MemoryStore;
pub use partition::{IndexDef, Partition};
pub use storage::{CacheStore, SqliteStore};
pub use traits::{CachedRecord, Cacheable};
