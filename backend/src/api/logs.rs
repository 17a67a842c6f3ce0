//! In-process progress broadcasting.
//!
//! Two global channels feed Server-Sent Events subscribers:
//! - [`LOG_BROADCASTER`] carries step messages, also echoed to stdout
//! - [`REPORT_BROADCASTER`] carries live report events, one per validated row
//!
//! Sending never blocks and never fails: with no subscriber the message is
//! simply dropped.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Step logs
// =============================================================================

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Console rendering of the entry.
    pub fn console_line(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "  ",
            LogLevel::Success => " ✓",
            LogLevel::Warning => " ⚠️",
            LogLevel::Error => " ❌",
        };
        format!("{}{} {}", "   ".repeat(self.indent as usize), prefix, self.message)
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to stdout and all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn log(&self, entry: LogEntry) {
        println!("{}", entry.console_line());
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

// =============================================================================
// Live report
// =============================================================================

/// One update of the live validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReportEvent {
    /// A run began; `total` rows will follow.
    #[serde(rename_all = "camelCase")]
    Started { job_id: String, total: usize },
    /// One row fragment with the running tallies.
    #[serde(rename_all = "camelCase")]
    Row {
        job_id: String,
        html: String,
        accepted: usize,
        rejected: usize,
    },
    /// The run completed.
    #[serde(rename_all = "camelCase")]
    Finished {
        job_id: String,
        accepted: usize,
        rejected: usize,
    },
}

impl ReportEvent {
    pub fn job_id(&self) -> &str {
        match self {
            ReportEvent::Started { job_id, .. }
            | ReportEvent::Row { job_id, .. }
            | ReportEvent::Finished { job_id, .. } => job_id,
        }
    }
}

/// Global live report broadcaster
pub static REPORT_BROADCASTER: Lazy<ReportBroadcaster> = Lazy::new(ReportBroadcaster::new);

/// Fans report events out to SSE clients. Nothing is printed.
pub struct ReportBroadcaster {
    sender: broadcast::Sender<ReportEvent>,
}

impl ReportBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: ReportEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.sender.subscribe()
    }
}

impl Default for ReportBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_json() {
        let entry = LogEntry::new(LogLevel::Warning, "careful").with_indent(2);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "careful");
        assert_eq!(json["indent"], 2);
    }

    #[test]
    fn test_console_line_indent() {
        let line = LogEntry::new(LogLevel::Info, "step").with_indent(1).console_line();
        assert!(line.starts_with("   "));
        assert!(line.ends_with("step"));
    }

    #[tokio::test]
    async fn test_log_broadcast() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        broadcaster.log(LogEntry::new(LogLevel::Success, "done"));

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.message, "done");
    }

    #[tokio::test]
    async fn test_report_events() {
        let broadcaster = ReportBroadcaster::new();
        // No subscriber: dropped silently
        broadcaster.publish(ReportEvent::Started { job_id: "j".into(), total: 1 });

        let mut rx = broadcaster.subscribe();
        broadcaster.publish(ReportEvent::Finished {
            job_id: "j".into(),
            accepted: 1,
            rejected: 0,
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.job_id(), "j");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "finished");
        assert_eq!(json["jobId"], "j");
    }
}
