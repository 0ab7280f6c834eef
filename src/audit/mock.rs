use super::{AuditEntry, AuditFuture, AuditSink};
use crate::error::AuditError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock audit sink for testing and dry runs
///
/// Records every entry it receives and optionally fails or delays each write.
/// Clones share the same recording, so a test can keep one handle and give the
/// other to a coordinator.
#[derive(Debug, Clone, Default)]
pub struct MockAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockAuditSink {
    /// Create a mock sink that accepts every entry
    ///
    /// # Example
    /// ```
    /// use triage::audit::MockAuditSink;
    ///
    /// let sink = MockAuditSink::new();
    /// assert_eq!(sink.call_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sink whose writes always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Add a delay before every write completes
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of writes attempted, including failed ones
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Every entry received so far
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    /// The most recent entry received
    pub fn last_entry(&self) -> Option<AuditEntry> {
        self.lock().last().cloned()
    }

    /// Forget all recorded entries
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEntry>> {
        // A poisoned recording is still a valid recording
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditSink for MockAuditSink {
    fn write<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a> {
        Box::pin(async move {
            self.lock().push(entry.clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match &self.failure {
                Some(message) => Err(AuditError::SinkFailed(message.clone())),
                None => Ok(()),
            }
        })
    }
}
