//! User-visible notifications (toasts).

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// A completed action.
    Success,
    /// A rejected action.
    Error,
}

/// Fire-and-forget notification sink.
///
/// Implementations must not block; display and delivery are best effort.
pub trait NotificationSink: Send + Sync {
    /// Shows `message` to the user.
    fn notify(&self, message: &str, severity: Severity);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(target: "classroom::notify", "{message}"),
            Severity::Info | Severity::Success => {
                info!(target: "classroom::notify", ?severity, "{message}");
            }
        }
    }
}

/// Keeps every notification in memory, in call order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Severity)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of notifications received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((message.to_string(), severity));
        }
    }
}
