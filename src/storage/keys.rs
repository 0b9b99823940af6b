//! Namespaced keys over the engine's single flat keyspace.
//!
//! Log keys are `LOG_PREFIX ++ index.to_be_bytes()`. The fixed-width
//! big-endian suffix makes byte order equal numeric order, so first/last index
//! and contiguous ranges come straight out of ordered iteration.
//! Metadata keys are `META_PREFIX ++ raw key`.

use crate::constants::LOG_KEY_LEN;
use crate::constants::LOG_NAMESPACE;
use crate::constants::LOG_PREFIX;
use crate::constants::META_PREFIX;
use crate::convert::safe_kv;
use crate::convert::safe_vk;
use crate::ConvertError;
use crate::Result;

/// Engine key of the log entry at `index`.
pub fn log_key(index: u64) -> [u8; LOG_KEY_LEN] {
    let mut key = [0u8; LOG_KEY_LEN];
    key[..LOG_PREFIX.len()].copy_from_slice(LOG_PREFIX);
    key[LOG_PREFIX.len()..].copy_from_slice(&safe_kv(index));
    key
}

/// Engine key of the metadata entry `key`.
pub fn meta_key(key: &[u8]) -> Vec<u8> {
    let mut prefixed = Vec::with_capacity(META_PREFIX.len() + key.len());
    prefixed.extend_from_slice(META_PREFIX);
    prefixed.extend_from_slice(key);
    prefixed
}

/// Decodes the index out of a stored log key.
pub fn index_from_log_key(key: &[u8]) -> Result<u64> {
    let suffix = key.strip_prefix(LOG_PREFIX).ok_or(ConvertError::MissingPrefix {
        namespace: LOG_NAMESPACE,
    })?;
    safe_vk(suffix)
}
