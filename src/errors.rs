//! Raft Store Error Hierarchy
//!
//! Errors are grouped by the layer that raises them: storage engine, log
//! codec, configuration and runtime. Callers branch on
//! [`Error::is_not_found`] to tell "never written" apart from a storage
//! failure.

use std::path::PathBuf;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine, key-space and write path failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Log entry serialization failures
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Background maintenance needs a tokio runtime to be spawned on
    #[error("Store must be opened inside a tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

impl Error {
    /// True for an absent log index or an absent metadata key.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::LogNotFound { .. }) | Error::Storage(StorageError::KeyNotFound)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No log entry is stored under the requested index
    #[error("log entry not found: index {index}")]
    LogNotFound { index: u64 },

    /// No metadata value is stored under the requested key
    #[error("not found")]
    KeyNotFound,

    /// A single encoded entry does not fit into one transaction.
    /// Retrying the same write cannot succeed.
    #[error("log entry {index} is too large for one transaction: {size} bytes (limit {limit} bytes)")]
    EntryTooLarge { index: u64, size: usize, limit: usize },

    /// A `store_logs` batch exceeds the transaction budget
    #[error("batch of {entries} log entries ({size} bytes) exceeds the transaction limits")]
    BatchTooLarge { entries: usize, size: usize },

    /// The write transaction reached its entry or byte budget
    #[error("transaction too big: {entries} entries, {size} bytes staged")]
    TxnTooBig { entries: usize, size: usize },

    /// Conflict detection refused to overwrite an existing log index
    #[error("log entry {index} already exists")]
    Conflict { index: u64 },

    /// Embedded database errors
    #[error(transparent)]
    Db(#[from] sled::Error),

    /// Failed to prepare the data directory
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error type for value conversion operations
    #[error("Value convert failed")]
    Convert(#[from] ConvertError),
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A field of the entry cannot be represented by the wire schema
    #[error("cannot encode log entry {index}: {reason}")]
    Encode { index: u64, reason: String },

    /// Stored bytes are not a valid log record
    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    /// Stored log type tag is outside the known set
    #[error("unknown log type: {0}")]
    UnknownLogType(i32),

    /// Stored append time does not fit the platform clock
    #[error("invalid appended_at timestamp: {0} ns since unix epoch")]
    InvalidTimestamp(u64),
}

/// Error type for value conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Invalid input length error
    ///
    /// This occurs when the input byte slice length doesn't match the required 8 bytes.
    #[error("invalid byte length: expected 8 bytes, received {0} bytes")]
    InvalidLength(usize),

    /// A stored key is missing the expected namespace prefix
    #[error("key does not carry the {namespace} prefix")]
    MissingPrefix { namespace: &'static str },
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(StorageError::Db(e))
    }
}

impl From<ConvertError> for Error {
    fn from(e: ConvertError) -> Self {
        Error::Storage(StorageError::Convert(e))
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Codec(CodecError::Decode(e))
    }
}
