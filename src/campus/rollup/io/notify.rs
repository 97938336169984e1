use std::sync::Mutex;

use tracing::{info, warn};

use crate::campus::rollup::ports::Notifier;

/// Sends summaries and warnings to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn summary(&self, message: &str) {
        info!(target: "campus_rollup::summary", "{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Keeps every message it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    summaries: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> Vec<String> {
        lock(&self.summaries).clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn summary(&self, message: &str) {
        lock(&self.summaries).push(message.to_string());
    }

    fn warn(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }
}

fn lock(messages: &Mutex<Vec<String>>) -> std::sync::MutexGuard<'_, Vec<String>> {
    messages
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
