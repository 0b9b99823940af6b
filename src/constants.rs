// -
// Key namespaces

/// The engine has a single flat keyspace. Every key starts with one of these
/// prefixes so log entries and metadata live in disjoint, ordered partitions.
/// Both prefixes have the same length and neither is a prefix of the other.
pub(crate) const LOG_PREFIX: &[u8] = b"l.";
pub(crate) const META_PREFIX: &[u8] = b"m.";

pub(crate) const LOG_NAMESPACE: &str = "log";

/// Width of an encoded log index.
pub(crate) const INDEX_LEN: usize = 8;

/// Full length of a log key: prefix plus big-endian index.
pub(crate) const LOG_KEY_LEN: usize = LOG_PREFIX.len() + INDEX_LEN;

/// Returned by first/last index lookups when the log is empty.
pub const EMPTY_LOG_INDEX: u64 = 0;

/// Per-operation bookkeeping charged against the transaction byte budget on
/// top of key and value length.
pub(crate) const TXN_OP_OVERHEAD: usize = 16;

/// Sled database directory below the configured data dir
pub(crate) const DB_DIR_NAME: &str = "raft_store";
