//! Progress events and the observer sink shared by all workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Severity of a progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// Routine progress
    Info,
    /// A file or the whole batch finished
    Success,
    /// Recoverable problem, work continues
    Warning,
    /// A file or the batch failed
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Info => write!(f, "info"),
            EventLevel::Success => write!(f, "success"),
            EventLevel::Warning => write!(f, "warning"),
            EventLevel::Error => write!(f, "error"),
        }
    }
}

/// One entry of the progress stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A human-readable progress line
    Message {
        /// Severity
        level: EventLevel,
        /// Line text
        message: String,
        /// Emission time
        at: DateTime<Utc>,
    },
    /// End of stream
    Done,
}

impl ProgressEvent {
    /// Severity, `None` for the sentinel
    pub fn level(&self) -> Option<EventLevel> {
        match self {
            ProgressEvent::Message { level, .. } => Some(*level),
            ProgressEvent::Done => None,
        }
    }

    /// Line text, `None` for the sentinel
    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressEvent::Message { message, .. } => Some(message),
            ProgressEvent::Done => None,
        }
    }
}

/// Cloneable, non-blocking sender half of the progress stream
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Create a sink and the single receiver that drains it
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an [`EventLevel::Info`] line
    pub fn info(&self, message: impl Into<String>) {
        self.emit(EventLevel::Info, message.into());
    }

    /// Emit an [`EventLevel::Success`] line
    pub fn success(&self, message: impl Into<String>) {
        self.emit(EventLevel::Success, message.into());
    }

    /// Emit an [`EventLevel::Warning`] line
    pub fn warn(&self, message: impl Into<String>) {
        self.emit(EventLevel::Warning, message.into());
    }

    /// Emit an [`EventLevel::Error`] line
    pub fn error(&self, message: impl Into<String>) {
        self.emit(EventLevel::Error, message.into());
    }

    /// Send the terminal sentinel
    pub fn finish(&self) {
        self.send(ProgressEvent::Done);
    }

    fn emit(&self, level: EventLevel, message: String) {
        self.send(ProgressEvent::Message {
            level,
            message,
            at: Utc::now(),
        });
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is watching; keep working.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.info("start");
        sink.error("boom");
        sink.finish();

        assert_eq!(rx.recv().await.unwrap().message(), Some("start"));
        assert_eq!(rx.recv().await.unwrap().level(), Some(EventLevel::Error));
        assert_eq!(rx.recv().await.unwrap(), ProgressEvent::Done);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_ignored() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.success("nobody listening");
        ProgressSink::disabled().finish();
    }

    #[test]
    fn test_event_json_shape() {
        let event = ProgressEvent::Message {
            level: EventLevel::Success,
            message: "done".into(),
            at: Utc::now(),
        };
        assert_json_include!(
            actual: serde_json::to_value(&event).unwrap(),
            expected: serde_json::json!({"type": "message", "level": "success", "message": "done"})
        );
        assert_eq!(
            serde_json::to_value(ProgressEvent::Done).unwrap(),
            serde_json::json!({"type": "done"})
        );
    }
}
