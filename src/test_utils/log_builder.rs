use std::ops::RangeInclusive;

use crate::Log;
use crate::LogType;

/// Hands out consecutive log entries starting at a given index.
pub struct LogBuilder {
    index: u64,
    term: u64,
}

impl LogBuilder {
    pub fn new(
        start_index: u64,
        term: u64,
    ) -> Self {
        Self {
            index: start_index,
            term,
        }
    }

    pub fn command(
        mut self,
        data: &[u8],
    ) -> (Self, Log) {
        let log = Log::command(self.index, self.term, data.to_vec());
        self.index += 1;
        (self, log)
    }

    pub fn noop(mut self) -> (Self, Log) {
        let log = Log::new(self.index, self.term, LogType::Noop, Vec::new());
        self.index += 1;
        (self, log)
    }
}

/// One command entry per index, payload `log{index}`.
pub fn command_logs(range: RangeInclusive<u64>) -> Vec<Log> {
    range
        .map(|i| Log::command(i, i, format!("log{i}").into_bytes()))
        .collect()
}
