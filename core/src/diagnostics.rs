//! Captured diagnostics.
//!
//! [`DiagnosticBuffer`] forwards every message to the `log` facade and keeps a
//! copy in a bounded ring buffer, so callers (tests, tools, editors) can read
//! back what a build reported without installing a global logger.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// A single captured diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

struct Ring {
    entries: VecDeque<Diagnostic>,
    max_capacity: usize,
}

impl Ring {
    fn push(&mut self, entry: Diagnostic) {
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

/// Shared ring buffer of diagnostics.
///
/// Cloning the buffer yields another handle to the same storage.
#[derive(Clone)]
pub struct DiagnosticBuffer {
    ring: Arc<Mutex<Ring>>,
}

impl DiagnosticBuffer {
    /// Default number of retained entries.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a buffer retaining at most `max_capacity` entries (at least one).
    pub fn new(max_capacity: usize) -> Self {
        let max_capacity = max_capacity.max(1);
        Self {
            ring: Arc::new(Mutex::new(Ring {
                entries: VecDeque::with_capacity(max_capacity.min(1024)),
                max_capacity,
            })),
        }
    }

    /// Logs `message` at `level` and records it.
    pub fn report(&self, level: log::Level, target: &str, message: impl Into<String>) {
        let message = message.into();
        log::log!(target: target, level, "{message}");
        self.ring.lock().push(Diagnostic {
            level,
            target: target.to_owned(),
            message,
            timestamp: Instant::now(),
        });
    }

    /// Logs and records an error.
    pub fn error(&self, target: &str, message: impl Into<String>) {
        self.report(log::Level::Error, target, message);
    }

    /// Logs and records a warning.
    pub fn warn(&self, target: &str, message: impl Into<String>) {
        self.report(log::Level::Warn, target, message);
    }

    /// Logs and records an informational message.
    pub fn info(&self, target: &str, message: impl Into<String>) {
        self.report(log::Level::Info, target, message);
    }

    /// Snapshot of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.ring.lock().entries.iter().cloned().collect()
    }

    /// Retained entries at `level`.
    pub fn entries_at(&self, level: log::Level) -> Vec<Diagnostic> {
        self.ring
            .lock()
            .entries
            .iter()
            .filter(|d| d.level == level)
            .cloned()
            .collect()
    }

    /// Returns `true` if any retained message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.ring
            .lock()
            .entries
            .iter()
            .any(|d| d.message.contains(needle))
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.ring.lock().entries.len()
    }

    /// Returns `true` if nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every retained entry.
    pub fn clear(&self) {
        self.ring.lock().entries.clear();
    }
}

impl Default for DiagnosticBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for DiagnosticBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticBuffer")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_messages_in_order() {
        let buffer = DiagnosticBuffer::new(8);
        buffer.error("test", "first");
        buffer.warn("test", "second");
        buffer.info("test", "third");

        let entries = buffer.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[0].level, log::Level::Error);
        assert_eq!(entries[2].message, "third");
        assert_eq!(buffer.entries_at(log::Level::Warn).len(), 1);
    }

    #[test]
    fn drops_oldest_when_full() {
        let buffer = DiagnosticBuffer::new(2);
        buffer.error("test", "a");
        buffer.error("test", "b");
        buffer.error("test", "c");

        let messages: Vec<_> = buffer.entries().into_iter().map(|d| d.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn clones_share_storage() {
        let buffer = DiagnosticBuffer::default();
        let other = buffer.clone();
        other.error("test", "shared shader text");
        assert!(buffer.contains("shader text"));
        buffer.clear();
        assert!(other.is_empty());
    }
}
