//! Log entry model and its on-disk codec.
//!
//! Entries are stored as a protobuf `LogRecord`. Every field survives a round
//! trip unchanged, zero values and empty payloads included.

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use prost::Message;

use crate::CodecError;
use crate::Result;

/// Kind of a replicated log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogType {
    /// Application command for the state machine
    Command = 0,
    /// Written by a new leader to commit entries from earlier terms
    Noop = 1,
    AddPeerDeprecated = 2,
    RemovePeerDeprecated = 3,
    /// Ensures all preceding operations are applied
    Barrier = 4,
    /// Cluster membership configuration
    Configuration = 5,
}

/// A consensus log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    pub index: u64,
    pub term: u64,
    pub log_type: LogType,
    pub data: Vec<u8>,
    /// Opaque bytes reserved for the consensus layer
    pub extensions: Vec<u8>,
    /// When the leader appended the entry, if recorded
    pub appended_at: Option<SystemTime>,
}

impl Log {
    pub fn new(
        index: u64,
        term: u64,
        log_type: LogType,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            index,
            term,
            log_type,
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn command(
        index: u64,
        term: u64,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self::new(index, term, LogType::Command, data)
    }
}

/// Wire form of [`Log`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub(crate) struct LogRecord {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(enumeration = "LogType", tag = "3")]
    pub log_type: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub data: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub extensions: Vec<u8>,
    #[prost(fixed64, optional, tag = "6")]
    pub appended_at_unix_nanos: Option<u64>,
}

pub fn encode_log(log: &Log) -> Result<Vec<u8>> {
    let appended_at_unix_nanos = match log.appended_at {
        Some(at) => Some(unix_nanos(log.index, at)?),
        None => None,
    };

    let record = LogRecord {
        index: log.index,
        term: log.term,
        log_type: log.log_type.into(),
        data: log.data.clone(),
        extensions: log.extensions.clone(),
        appended_at_unix_nanos,
    };
    Ok(record.encode_to_vec())
}

pub fn decode_log(bytes: &[u8]) -> Result<Log> {
    let record = LogRecord::decode(bytes)?;

    let log_type = LogType::try_from(record.log_type).map_err(|_| CodecError::UnknownLogType(record.log_type))?;
    let appended_at = match record.appended_at_unix_nanos {
        Some(nanos) => Some(
            UNIX_EPOCH
                .checked_add(Duration::from_nanos(nanos))
                .ok_or(CodecError::InvalidTimestamp(nanos))?,
        ),
        None => None,
    };

    Ok(Log {
        index: record.index,
        term: record.term,
        log_type,
        data: record.data,
        extensions: record.extensions,
        appended_at,
    })
}

fn unix_nanos(
    index: u64,
    at: SystemTime,
) -> std::result::Result<u64, CodecError> {
    let since_epoch = at.duration_since(UNIX_EPOCH).map_err(|_| CodecError::Encode {
        index,
        reason: "appended_at precedes the unix epoch".into(),
    })?;
    u64::try_from(since_epoch.as_nanos()).map_err(|_| CodecError::Encode {
        index,
        reason: "appended_at overflows 64-bit nanoseconds".into(),
    })
}
