//! Bounded, append-only operational event log.
//!
//! Records connects, disconnects, spikes, alerts and periodic summaries for
//! audit/diagnostics. Enforced maximum capacity with oldest-first eviction;
//! the most recent entries are replayed to late-joining subscribers.

use crate::types::{LogEntry, LogLevel};
use chrono::Utc;
use std::collections::VecDeque;

/// FIFO ring buffer of [`LogEntry`] values. Purely in-memory, infallible.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1) + 1),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Append a timestamped, leveled entry; evicts the oldest on overflow.
    /// Returns a clone of the stored entry for immediate broadcast.
    pub fn push(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> LogEntry {
        let entry = LogEntry {
            id: self.next_id,
            level,
            message: message.into(),
            payload,
            timestamp: Utc::now(),
        };
        self.next_id += 1;

        self.entries.push_back(entry.clone());
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        entry
    }

    /// The most recent `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
