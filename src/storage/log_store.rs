//! Log store contract consumed by the consensus layer.

use crate::Log;
use crate::Result;

/// Durable, append-only storage of consensus log entries addressed by index.
pub trait LogStore: Send + Sync {
    /// Smallest stored index, or `0` when the log is empty.
    fn first_index(&self) -> Result<u64>;

    /// Largest stored index, or `0` when the log is empty.
    fn last_index(&self) -> Result<u64>;

    /// Fails with a not-found error when nothing is stored at `index`.
    fn get_log(
        &self,
        index: u64,
    ) -> Result<Log>;

    fn store_log(
        &self,
        log: &Log,
    ) -> Result<()>;

    /// Writes all entries atomically, or none of them.
    fn store_logs(
        &self,
        logs: &[Log],
    ) -> Result<()>;

    /// Removes every entry with index in `[min, max]`.
    fn delete_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<()>;
}
