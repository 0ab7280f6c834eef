//! Dispatch coordinator
//!
//! Fans a normalized record out to the presentation sink and the audit sink. Each
//! sink runs inside its own failure boundary: a failing or panicking notification
//! target never stops the audit write, and a failing audit write never reaches
//! the caller. Both sinks are attempted exactly once per dispatch.

use crate::audit::{AuditEntry, AuditSink};
use crate::classifier::RuntimeFault;
use crate::error::{AuditError, NotifyError};
use crate::notify::{Notification, NotificationMode, NotifyTarget, DEFAULT_TITLE};
use crate::record::NormalizedError;
use log::{debug, error, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of the presentation sink for one dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationOutcome {
    Delivered,
    /// Target had neither a callable nor an event-dispatch shape
    Dropped,
    Failed(NotifyError),
}

/// Per-sink outcomes of one dispatch, for diagnostics and tests
#[derive(Debug)]
pub struct DispatchReport {
    pub presentation: PresentationOutcome,
    pub audit: Result<(), AuditError>,
}

/// Routes normalized records to the notification target and the audit sink
#[derive(Clone)]
pub struct DispatchCoordinator {
    audit: Arc<dyn AuditSink>,
    title: String,
    mode: NotificationMode,
    audit_timeout: Option<Duration>,
}

impl DispatchCoordinator {
    /// Create a coordinator writing to `audit` with the default title and sticky mode
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            audit,
            title: DEFAULT_TITLE.to_string(),
            mode: NotificationMode::Sticky,
            audit_timeout: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_mode(mut self, mode: NotificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Bound each audit write; `None` waits indefinitely
    pub fn with_audit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.audit_timeout = timeout;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Deliver a record to both sinks; never fails
    pub async fn dispatch(&self, record: &NormalizedError, target: &NotifyTarget) {
        self.dispatch_for_record(record, target, None).await;
    }

    /// Deliver a record to both sinks, attaching `record_id` to the audit entry
    pub async fn dispatch_for_record(
        &self,
        record: &NormalizedError,
        target: &NotifyTarget,
        record_id: Option<&str>,
    ) -> DispatchReport {
        let presentation = self.present(record, target);
        let audit = self.audit(record, record_id).await;
        DispatchReport {
            presentation,
            audit,
        }
    }

    /// Presentation boundary
    fn present(&self, record: &NormalizedError, target: &NotifyTarget) -> PresentationOutcome {
        let notification = Notification::for_record(record, &self.title, self.mode);

        let delivered = panic::catch_unwind(AssertUnwindSafe(|| target.deliver(&notification)))
            .unwrap_or_else(|payload| {
                let fault = RuntimeFault::from_panic(payload.as_ref());
                Err(NotifyError::TargetPanicked(fault.message))
            });

        match delivered {
            Ok(true) => {
                debug!("Notification delivered: {}", notification.message);
                PresentationOutcome::Delivered
            }
            Ok(false) => {
                warn!(
                    "Notification cannot be dispatched, no usable target: {}",
                    record.message
                );
                PresentationOutcome::Dropped
            }
            Err(e) => {
                error!("Notification dispatch failed: {}", e);
                PresentationOutcome::Failed(e)
            }
        }
    }

    /// Audit boundary
    ///
    /// The write runs on its own task so a panicking sink surfaces as a join error.
    async fn audit(
        &self,
        record: &NormalizedError,
        record_id: Option<&str>,
    ) -> Result<(), AuditError> {
        let entry = AuditEntry::from_record(record, record_id);
        let sink = Arc::clone(&self.audit);
        let submitted = entry.clone();
        let mut write = tokio::spawn(async move { sink.write(&submitted).await });

        let joined = match self.audit_timeout {
            Some(limit) => tokio::time::timeout(limit, &mut write)
                .await
                .map_err(|_| limit),
            None => Ok((&mut write).await),
        };

        let result = match joined {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => {
                let fault = RuntimeFault::from_panic(join_error.into_panic().as_ref());
                Err(AuditError::SinkPanicked(fault.message))
            }
            Ok(Err(join_error)) => Err(AuditError::SinkFailed(join_error.to_string())),
            Err(limit) => {
                write.abort();
                Err(AuditError::Timeout(limit))
            }
        };

        match &result {
            Ok(()) => debug!("Audit entry written: {}", entry.error_type),
            Err(e) => error!("Audit logging failed: {}", e),
        }
        result
    }
}
