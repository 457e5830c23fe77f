use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::ScheduleConfig;

/// The kinds of entries a run writes to its history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogEvent {
    #[serde(rename = "Timer Started")]
    TimerStarted,
    #[serde(rename = "Timer Stopped")]
    TimerStopped,
    #[serde(rename = "Match Start")]
    MatchStart,
    #[serde(rename = "Match End")]
    MatchEnd,
}

/// One timestamped history entry. Immutable once appended.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub event: LogEvent,
    pub time: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ScheduleConfig>,
}

impl LogEntry {
    pub fn new(event: LogEvent, time: DateTime<Local>) -> Self {
        Self {
            event,
            time,
            configuration: None,
        }
    }

    /// Entry carrying the configuration that started a run.
    pub fn with_configuration(
        event: LogEvent,
        time: DateTime<Local>,
        configuration: ScheduleConfig,
    ) -> Self {
        Self {
            event,
            time,
            configuration: Some(configuration),
        }
    }
}

/// Append-only run history.
///
/// Appends happen under the lock; readers get a copied snapshot and can never
/// observe a partial append. Entries are only ever removed wholesale by
/// `clear`.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        *self.entries.lock().unwrap() = Vec::new();
    }
}
