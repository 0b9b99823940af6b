//! Raft log store and stable store over one flat sled keyspace.
//!
//! [`RaftStore`] implements both [`LogStore`] and [`StableStore`]. Log entries
//! and metadata are kept apart by key prefix, and background workers reclaim
//! space and force durability syncs while the store is open.

mod config;
mod constants;
mod errors;
mod maintenance;
pub mod metrics;
mod storage;
pub mod utils;

pub use config::*;
pub use constants::EMPTY_LOG_INDEX;
pub use errors::*;
pub use maintenance::MaintenanceHandle;
pub use maintenance::MaintenanceTarget;
pub use storage::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
