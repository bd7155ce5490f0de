//! Observer log.
//!
//! A fixed-capacity ring of [`LogRecord`]s. Every tick that the observed
//! agent's state actually changes, a [`crate::classify::ObserverCapture`] is
//! pushed; callers drain what's new with [`ObserverLog::poll_since_last_call`].
//! If more records are pushed between two polls than the ring holds, the
//! oldest of those are gone for good, and the returned snapshot's `wrapped`
//! flag tells the caller that happened so it knows its view may have gaps.

use crate::classify::ObserverCapture;
use crate::types::{LogRecord, LogsSnapshot, LOG_CAPACITY};

pub struct ObserverLog {
    buffer: Vec<Option<LogRecord>>,
    /// Total records ever pushed, never reset; used to derive ring index and
    /// to detect, at poll time, how much the caller missed.
    total_written: u64,
    /// Position in `total_written` terms of the last poll's end.
    last_polled: u64,
}

impl ObserverLog {
    pub fn new() -> Self {
        Self {
            buffer: vec![None; LOG_CAPACITY],
            total_written: 0,
            last_polled: 0,
        }
    }

    pub fn push(&mut self, tick: u64, capture: ObserverCapture) {
        let record = LogRecord {
            tick,
            agent_id: capture.agent_id,
            prev_state: capture.prev_state,
            new_state: capture.new_state,
            changer_id: capture.changer_id,
        };
        let index = (self.total_written % LOG_CAPACITY as u64) as usize;
        self.buffer[index] = Some(record);
        self.total_written += 1;
    }

    /// Returns every record pushed since the last call to this method, in
    /// chronological order. If more than `LOG_CAPACITY` records were pushed
    /// since the last poll, the oldest of those are unrecoverable and
    /// `wrapped` is set on the returned snapshot.
    pub fn poll_since_last_call(&mut self) -> LogsSnapshot {
        let new_count = self.total_written - self.last_polled;
        let capacity = LOG_CAPACITY as u64;
        let readable = new_count.min(capacity);
        let lost = new_count > capacity;

        let start = self.total_written - readable;
        let mut records = Vec::with_capacity(readable as usize);
        for i in start..self.total_written {
            let index = (i % capacity) as usize;
            if let Some(record) = self.buffer[index] {
                records.push(record);
            }
        }

        self.last_polled = self.total_written;
        LogsSnapshot {
            records,
            wrapped: lost,
        }
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }
}

impl Default for ObserverLog {
    fn default() -> Self {
        Self::new()
    }
}
