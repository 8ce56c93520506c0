//! Ordered message sink shared by the checking components.
//!
//! Every defect and advisory found while checking a data model goes through a
//! [`LogSink`] handed to the component doing the work. [`TracingLog`] only
//! forwards to `tracing`; [`MemoryLog`] also keeps the messages in order so
//! callers (and tests) can inspect exactly what was reported.

use serde::{Deserialize, Serialize};

use crate::core::DataModelError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

pub trait LogSink {
    fn emit(&mut self, entry: LogEntry);

    fn critical(&mut self, message: String) {
        self.emit(LogEntry::new(Severity::Critical, message));
    }

    fn warning(&mut self, message: String) {
        self.emit(LogEntry::new(Severity::Warning, message));
    }

    fn info(&mut self, message: String) {
        self.emit(LogEntry::new(Severity::Info, message));
    }
}

fn trace_entry(entry: &LogEntry) {
    match entry.severity {
        Severity::Critical => tracing::error!("{}", entry.message),
        Severity::Warning => tracing::warn!("{}", entry.message),
        Severity::Info => tracing::info!("{}", entry.message),
    }
}

/// Sink that only forwards to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn emit(&mut self, entry: LogEntry) {
        trace_entry(&entry);
    }
}

/// Sink that records every entry in order, then forwards it to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    entries: Vec<LogEntry>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }

    /// Message `back` positions from the end: `recent(1)` is the last one.
    pub fn recent(&self, back: usize) -> Option<&str> {
        if back == 0 || back > self.entries.len() {
            return None;
        }
        Some(self.entries[self.entries.len() - back].message.as_str())
    }

    pub fn contains(&self, message: &str) -> bool {
        self.entries.iter().any(|e| e.message == message)
    }

    pub fn count(&self, message: &str) -> usize {
        self.entries.iter().filter(|e| e.message == message).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn take(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }
}

impl LogSink for MemoryLog {
    fn emit(&mut self, entry: LogEntry) {
        trace_entry(&entry);
        self.entries.push(entry);
    }
}

/// Report a defect with strict/non-strict duality.
///
/// Strict mode logs the message as critical and returns it as an error built
/// by `raise`; otherwise the message is logged as a warning and processing
/// continues.
pub(crate) fn defect(
    sink: &mut dyn LogSink,
    strict: bool,
    message: String,
    raise: fn(String) -> DataModelError,
) -> Result<(), DataModelError> {
    if strict {
        sink.critical(message.clone());
        Err(raise(message))
    } else {
        sink.warning(message);
        Ok(())
    }
}
