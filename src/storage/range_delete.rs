//! Deletion of a contiguous span of log entries.
//!
//! A span can be larger than one transaction allows. When staging a delete
//! hits the transaction budget, everything staged so far is committed and the
//! scan resumes right after the last deleted index in a fresh transaction.
//! The span is therefore not atomic as a whole: a crash between two commits
//! leaves a deleted prefix behind.

use tracing::debug;
use tracing::instrument;

use super::keys::index_from_log_key;
use super::keys::log_key;
use super::SledEngine;
use crate::Error;
use crate::Result;
use crate::StorageError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RangeDeleteStats {
    /// Log entries removed
    pub deleted: u64,
    /// Transactions committed
    pub commits: usize,
    /// Commits forced by the transaction budget
    pub partial_commits: usize,
}

/// Removes every log entry with index in `[min, max]`.
///
/// Stops at the first engine error that is not a budget overflow; entries
/// committed before that point stay deleted.
#[instrument(skip(engine))]
pub(crate) fn delete_log_range(
    engine: &SledEngine,
    min: u64,
    max: u64,
) -> Result<RangeDeleteStats> {
    let mut stats = RangeDeleteStats::default();
    if min > max {
        return Ok(stats);
    }

    let namespace_end = log_key(u64::MAX);
    let mut cursor = min;

    loop {
        let mut txn = engine.write_txn();
        let mut last_deleted: Option<u64> = None;
        let mut overflow: Option<Error> = None;

        for key in engine.keys_in(&log_key(cursor)[..]..=&namespace_end[..]) {
            let key = key?;
            let index = index_from_log_key(&key)?;
            if index > max {
                break;
            }

            match txn.delete(&key) {
                Ok(()) => last_deleted = Some(index),
                Err(e @ Error::Storage(StorageError::TxnTooBig { .. })) => {
                    overflow = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let staged = txn.len();
        txn.commit()?;
        if staged > 0 {
            stats.deleted += staged as u64;
            stats.commits += 1;
        }

        let Some(overflow) = overflow else {
            return Ok(stats);
        };

        // A fresh transaction that cannot hold a single delete never makes progress.
        let Some(last_deleted) = last_deleted else {
            return Err(overflow);
        };

        stats.partial_commits += 1;
        debug!(
            last_deleted,
            staged, "transaction budget reached, committed partial range deletion"
        );

        match last_deleted.checked_add(1) {
            Some(next) if next <= max => cursor = next,
            _ => return Ok(stats),
        }
    }
}
