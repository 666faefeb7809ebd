use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single log line returned by the log query API.
///
/// Records carry no server-assigned id, so two records are the same record
/// exactly when both the timestamp and the message match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRecord {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

impl LogRecord {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    pub fn class(&self) -> RecordClass {
        RecordClass::of(&self.message)
    }

    /// Local wall-clock time as `HH:MM:SS.mmm`.
    pub fn local_time(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
            None => self.timestamp.to_string(),
        }
    }
}

/// Severity class used for display styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    Error,
    Warning,
    Info,
    Default,
}

impl RecordClass {
    /// Classifies a message by the first matching marker, in priority order.
    pub fn of(message: &str) -> Self {
        if message.contains("ERROR") || message.contains("Error") {
            RecordClass::Error
        } else if message.contains("WARN") || message.contains("Warning") {
            RecordClass::Warning
        } else if message.contains("INFO")
            || message.contains("START")
            || message.contains("END")
        {
            RecordClass::Info
        } else {
            RecordClass::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordClass::Error => "error",
            RecordClass::Warning => "warning",
            RecordClass::Info => "info",
            RecordClass::Default => "default",
        }
    }
}

impl std::fmt::Display for RecordClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merges `fetched` into `accumulated`.
///
/// Fetched records are appended, duplicates are dropped keeping the first
/// occurrence, and the result is stable-sorted by timestamp.
pub fn merge_append(accumulated: &[LogRecord], fetched: Vec<LogRecord>) -> Vec<LogRecord> {
    let keep: Vec<bool> = {
        let mut seen: HashSet<(i64, &str)> =
            HashSet::with_capacity(accumulated.len() + fetched.len());
        accumulated
            .iter()
            .chain(fetched.iter())
            .map(|record| seen.insert((record.timestamp, record.message.as_str())))
            .collect()
    };

    let mut keep = keep.into_iter();
    let mut merged = Vec::with_capacity(accumulated.len() + fetched.len());
    for record in accumulated {
        if keep.next() == Some(true) {
            merged.push(record.clone());
        }
    }
    for record in fetched {
        if keep.next() == Some(true) {
            merged.push(record);
        }
    }

    merged.sort_by_key(|record| record.timestamp);
    merged
}

/// Replaces the accumulated records with a fresh fetch, sorted by timestamp.
pub fn replace(mut fetched: Vec<LogRecord>) -> Vec<LogRecord> {
    fetched.sort_by_key(|record| record.timestamp);
    fetched
}

/// Returns the records whose message contains `correlation`.
///
/// Matching is case-sensitive. `None` or an empty filter yields every record.
pub fn project<'a>(records: &'a [LogRecord], correlation: Option<&str>) -> Vec<&'a LogRecord> {
    match correlation.filter(|c| !c.is_empty()) {
        Some(needle) => records
            .iter()
            .filter(|record| record.message.contains(needle))
            .collect(),
        None => records.iter().collect(),
    }
}
