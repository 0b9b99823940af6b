use std::ops::RangeInclusive;
use std::path::Path;

use sled::transaction::ConflictableTransactionError;
use sled::transaction::TransactionError;
use sled::Batch;
use sled::Db;
use sled::IVec;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::trace;

use super::init_sled_db;
use crate::constants::TXN_OP_OVERHEAD;
use crate::maintenance::MaintenanceTarget;
use crate::EngineConfig;
use crate::Result;
use crate::StorageError;

/// One flat, ordered keyspace on top of a single sled tree.
///
/// Writes go through [`WriteTxn`], which enforces an entry and byte budget per
/// transaction and applies its staged operations atomically on commit.
pub struct SledEngine {
    db: Db,
    max_txn_entries: usize,
    max_txn_bytes: usize,
    log_txns: bool,
}

impl SledEngine {
    pub fn new(
        db: Db,
        config: &EngineConfig,
    ) -> Self {
        Self {
            db,
            max_txn_entries: config.max_txn_entries,
            max_txn_bytes: config.max_txn_bytes,
            log_txns: config.enable_logging,
        }
    }

    /// Opens the database below `data_dir` and wraps it.
    pub fn open(
        data_dir: impl AsRef<Path> + std::fmt::Debug,
        config: &EngineConfig,
    ) -> Result<Self> {
        let db = init_sled_db(data_dir, config)?;
        Ok(Self::new(db, config))
    }

    pub fn write_txn(&self) -> WriteTxn<'_> {
        WriteTxn {
            engine: self,
            ops: Vec::new(),
            size: 0,
        }
    }

    pub fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<IVec>> {
        Ok(self.db.get(key)?)
    }

    /// First key starting with `prefix`, in byte order.
    pub fn first_key_with_prefix(
        &self,
        prefix: &[u8],
    ) -> Result<Option<IVec>> {
        Ok(self.db.scan_prefix(prefix).keys().next().transpose()?)
    }

    /// Last key inside `range`, found by iterating backwards from its end.
    pub fn last_key_in(
        &self,
        range: RangeInclusive<&[u8]>,
    ) -> Result<Option<IVec>> {
        Ok(self.db.range(range).keys().next_back().transpose()?)
    }

    /// Keys inside `range` in ascending order.
    pub fn keys_in(
        &self,
        range: RangeInclusive<&[u8]>,
    ) -> impl Iterator<Item = Result<IVec>> {
        self.db.range(range).keys().map(|key| key.map_err(Into::into))
    }

    /// Drops every key of the keyspace.
    pub fn clear(&self) -> Result<()> {
        self.db.clear()?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn flush(&self) -> Result<()> {
        trace!("SledEngine flush");
        self.db.flush()?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> Result<u64> {
        Ok(self.db.size_on_disk()?)
    }

    pub fn max_txn_bytes(&self) -> usize {
        self.max_txn_bytes
    }

    /// Budget charged for writing `key` with `value_len` bytes of value.
    pub(crate) fn op_size(
        key_len: usize,
        value_len: usize,
    ) -> usize {
        key_len + value_len + TXN_OP_OVERHEAD
    }
}

impl MaintenanceTarget for SledEngine {
    /// Sled has no separate value-log collection, so a pass is a flush: segment
    /// cleaning happens inside sled as it writes. A pass counts as productive
    /// only when the on-disk footprint dropped to `ratio` of its size before
    /// the pass or below. Sled rarely shrinks that much in one flush, so in
    /// practice a cycle is a single pass.
    fn reclaim(
        &self,
        ratio: f64,
    ) -> Result<bool> {
        let before = self.db.size_on_disk()?;
        self.db.flush()?;
        let after = self.db.size_on_disk()?;

        let reclaimed = before > 0 && (after as f64) <= (before as f64) * ratio;
        debug!(before, after, reclaimed, "reclaim pass finished");
        Ok(reclaimed)
    }

    fn sync(&self) -> Result<()> {
        let flushed = self.db.flush()?;
        trace!(flushed, "sync finished");
        Ok(())
    }
}

impl std::fmt::Debug for SledEngine {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledEngine")
            .field("len", &self.db.len())
            .field("max_txn_entries", &self.max_txn_entries)
            .field("max_txn_bytes", &self.max_txn_bytes)
            .finish()
    }
}

impl Drop for SledEngine {
    fn drop(&mut self) {
        match self.db.flush() {
            Ok(_) => info!("Successfully flush SledEngine"),
            Err(e) => error!(?e, "Failed to flush SledEngine"),
        }
    }
}

enum TxnOp {
    Insert(Vec<u8>, Vec<u8>),
    Remove(Vec<u8>),
}

/// A bounded write transaction.
///
/// Staging fails with [`StorageError::TxnTooBig`] once the next operation
/// would exceed the engine's entry or byte budget; the operations staged so
/// far stay intact and can still be committed. Dropping the transaction
/// without committing discards it.
pub struct WriteTxn<'a> {
    engine: &'a SledEngine,
    ops: Vec<TxnOp>,
    size: usize,
}

impl WriteTxn<'_> {
    pub fn set(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.stage(SledEngine::op_size(key.len(), value.len()))?;
        self.ops.push(TxnOp::Insert(key.to_vec(), value.to_vec()));
        Ok(())
    }

    pub fn delete(
        &mut self,
        key: &[u8],
    ) -> Result<()> {
        self.stage(SledEngine::op_size(key.len(), 0))?;
        self.ops.push(TxnOp::Remove(key.to_vec()));
        Ok(())
    }

    fn stage(
        &mut self,
        op_size: usize,
    ) -> Result<()> {
        if self.ops.len() + 1 > self.engine.max_txn_entries || self.size + op_size > self.engine.max_txn_bytes {
            return Err(StorageError::TxnTooBig {
                entries: self.ops.len(),
                size: self.size,
            }
            .into());
        }
        self.size += op_size;
        Ok(())
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Estimated bytes charged against the budget so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Applies every staged operation as one atomic batch.
    pub fn commit(self) -> Result<()> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let (entries, size) = (self.ops.len(), self.size);
        let mut batch = Batch::default();
        for op in self.ops {
            match op {
                TxnOp::Insert(key, value) => batch.insert(key, value),
                TxnOp::Remove(key) => batch.remove(key),
            }
        }
        self.engine.db.apply_batch(batch)?;

        if self.engine.log_txns {
            debug!(entries, size, "committed write transaction");
        }
        Ok(())
    }

    /// Like [`WriteTxn::commit`], but refuses to overwrite keys that already
    /// exist. Nothing is written when a conflict is found and the first
    /// existing key is returned.
    pub fn commit_if_absent(self) -> Result<Option<IVec>> {
        if self.ops.is_empty() {
            return Ok(None);
        }

        let ops = &self.ops;
        let result: std::result::Result<(), TransactionError<IVec>> = self.engine.db.transaction(|tx| {
            for op in ops {
                match op {
                    TxnOp::Insert(key, value) => {
                        if tx.get(key.as_slice())?.is_some() {
                            return Err(ConflictableTransactionError::Abort(IVec::from(key.as_slice())));
                        }
                        tx.insert(key.as_slice(), value.as_slice())?;
                    }
                    TxnOp::Remove(key) => {
                        tx.remove(key.as_slice())?;
                    }
                }
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                if self.engine.log_txns {
                    debug!(entries = self.ops.len(), size = self.size, "committed write transaction");
                }
                Ok(None)
            }
            Err(TransactionError::Abort(key)) => Ok(Some(key)),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }
}
