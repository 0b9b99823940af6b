use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::trace;

use super::codec::decode_log;
use super::codec::encode_log;
use super::keys::index_from_log_key;
use super::keys::log_key;
use super::keys::meta_key;
use super::range_delete::delete_log_range;
use super::SledEngine;
use super::WriteTxn;
use crate::constants::EMPTY_LOG_INDEX;
use crate::constants::LOG_PREFIX;
use crate::convert::safe_kv;
use crate::convert::safe_vk;
use crate::metrics;
use crate::Error;
use crate::Log;
use crate::LogStore;
use crate::MaintenanceHandle;
use crate::Result;
use crate::StableStore;
use crate::StorageError;
use crate::StoreConfig;

/// Log store and stable store sharing one sled keyspace.
///
/// Log entries and metadata live under distinct key prefixes. While the store
/// is open, two background workers reclaim space and force durability syncs.
///
/// Foreground calls block on the engine. `RaftStore` is `Send + Sync` and can
/// be shared behind an `Arc`.
pub struct RaftStore {
    data_dir: PathBuf,
    engine: Arc<SledEngine>,
    detect_conflicts: bool,
    record_metrics: bool,
    maintenance: MaintenanceHandle,
}

impl RaftStore {
    /// Opens the store at `config.data_dir`, creating it when missing, and
    /// starts the maintenance workers on the current tokio runtime.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current()?;

        let engine = Arc::new(SledEngine::open(&config.data_dir, &config.engine)?);
        let record_metrics = config.engine.enable_metrics;
        if record_metrics {
            metrics::register_custom_metrics();
        }

        let maintenance = MaintenanceHandle::spawn(engine.clone(), &config.maintenance, &runtime, record_metrics);

        info!(data_dir = ?config.data_dir, "raft store opened");
        Ok(Self {
            data_dir: config.data_dir,
            engine,
            detect_conflicts: config.engine.detect_conflicts,
            record_metrics,
            maintenance,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Drops every log entry and every metadata key.
    pub fn reset(&self) -> Result<()> {
        self.engine.clear()?;
        info!("raft store reset");
        Ok(())
    }

    /// Stops the maintenance workers, then flushes and releases the engine.
    ///
    /// Consumes the store, so no call can reach a closed engine.
    pub async fn close(mut self) -> Result<()> {
        self.maintenance.shutdown().await;
        self.engine.flush()?;
        info!(data_dir = ?self.data_dir, "raft store closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &SledEngine {
        &self.engine
    }

    fn commit_logs(
        &self,
        txn: WriteTxn<'_>,
        count: usize,
    ) -> Result<()> {
        if self.detect_conflicts {
            if let Some(existing) = txn.commit_if_absent()? {
                return Err(StorageError::Conflict {
                    index: index_from_log_key(&existing)?,
                }
                .into());
            }
        } else {
            txn.commit()?;
        }

        if self.record_metrics {
            metrics::LOG_ENTRIES_WRITTEN.inc_by(count as u64);
        }
        Ok(())
    }
}

impl LogStore for RaftStore {
    fn first_index(&self) -> Result<u64> {
        match self.engine.first_key_with_prefix(LOG_PREFIX)? {
            Some(key) => index_from_log_key(&key),
            None => Ok(EMPTY_LOG_INDEX),
        }
    }

    fn last_index(&self) -> Result<u64> {
        match self.engine.last_key_in(&log_key(0)[..]..=&log_key(u64::MAX)[..])? {
            Some(key) => index_from_log_key(&key),
            None => Ok(EMPTY_LOG_INDEX),
        }
    }

    fn get_log(
        &self,
        index: u64,
    ) -> Result<Log> {
        match self.engine.get(&log_key(index))? {
            Some(bytes) => decode_log(&bytes),
            None => Err(StorageError::LogNotFound { index }.into()),
        }
    }

    /// Logs are append-only, so by default nothing checks for an existing
    /// entry at the same index. An entry that does not fit into a single
    /// transaction is reported as [`StorageError::EntryTooLarge`]; retrying
    /// cannot help.
    #[instrument(skip(self, log), fields(index = log.index))]
    fn store_log(
        &self,
        log: &Log,
    ) -> Result<()> {
        let value = encode_log(log)?;
        let key = log_key(log.index);

        let mut txn = self.engine.write_txn();
        txn.set(&key, &value).map_err(|e| match e {
            Error::Storage(StorageError::TxnTooBig { .. }) => StorageError::EntryTooLarge {
                index: log.index,
                size: SledEngine::op_size(key.len(), value.len()),
                limit: self.engine.max_txn_bytes(),
            }
            .into(),
            other => other,
        })?;

        self.commit_logs(txn, 1)
    }

    /// Every entry is encoded before anything is staged, so a codec failure
    /// leaves the store untouched. A batch beyond the transaction budget is
    /// refused as a whole.
    #[instrument(skip(self, logs), fields(len = logs.len()))]
    fn store_logs(
        &self,
        logs: &[Log],
    ) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }

        let encoded = logs
            .iter()
            .map(|log| Ok((log_key(log.index), encode_log(log)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut txn = self.engine.write_txn();
        for (key, value) in &encoded {
            if let Err(e) = txn.set(key, value) {
                return Err(match e {
                    Error::Storage(StorageError::TxnTooBig { .. }) => StorageError::BatchTooLarge {
                        entries: logs.len(),
                        size: encoded
                            .iter()
                            .map(|(key, value)| SledEngine::op_size(key.len(), value.len()))
                            .sum(),
                    }
                    .into(),
                    other => other,
                });
            }
        }

        trace!(staged = txn.len(), bytes = txn.size(), "store_logs staged");
        self.commit_logs(txn, logs.len())
    }

    #[instrument(skip(self))]
    fn delete_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<()> {
        let stats = delete_log_range(&self.engine, min, max)?;

        debug!(?stats, "delete_range finished");
        if self.record_metrics {
            metrics::LOG_ENTRIES_DELETED.inc_by(stats.deleted);
            metrics::RANGE_DELETE_PARTIAL_COMMITS.inc_by(stats.partial_commits as u64);
        }
        Ok(())
    }
}

impl StableStore for RaftStore {
    fn set(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let mut txn = self.engine.write_txn();
        txn.set(&meta_key(key), value)?;
        txn.commit()
    }

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Vec<u8>> {
        match self.engine.get(&meta_key(key))? {
            Some(value) => Ok(value.to_vec()),
            None => Err(StorageError::KeyNotFound.into()),
        }
    }

    fn set_u64(
        &self,
        key: &[u8],
        value: u64,
    ) -> Result<()> {
        self.set(key, &safe_kv(value))
    }

    fn get_u64(
        &self,
        key: &[u8],
    ) -> Result<u64> {
        safe_vk(self.get(key)?)
    }
}

impl std::fmt::Debug for RaftStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RaftStore")
            .field("data_dir", &self.data_dir)
            .field("engine", &self.engine)
            .finish()
    }
}
