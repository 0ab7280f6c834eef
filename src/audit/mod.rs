//! Audit sink: durable error log
//!
//! Every reported failure is submitted once to an [`AuditSink`]. Submission is
//! asynchronous and best-effort; the dispatch coordinator swallows failures.

pub mod file;
pub mod http;
pub mod mock;

pub use file::FileAuditSink;
pub use http::HttpAuditSink;
pub use mock::MockAuditSink;

use crate::error::AuditError;
use crate::record::{ErrorKind, NormalizedError, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Entry written to the audit collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub error_type: ErrorKind,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub record_id: Option<String>,
    pub severity: Severity,
    /// Origin label, omitted when the caller gave none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Build the audit entry for a normalized record
    pub fn from_record(record: &NormalizedError, record_id: Option<&str>) -> Self {
        Self {
            error_type: record.kind.clone(),
            error_message: record.message.clone(),
            stack_trace: record.trace_opt().map(str::to_string),
            record_id: record_id.map(str::to_string),
            severity: record.severity,
            context: if record.context.is_empty() {
                None
            } else {
                Some(record.context.clone())
            },
            logged_at: Utc::now(),
        }
    }
}

/// Future returned by audit sinks
pub type AuditFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + 'a>>;

/// Trait for durable audit log implementations
pub trait AuditSink: Send + Sync {
    fn write<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a>;
}

/// Sink that accepts and discards every entry
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardAuditSink;

impl AuditSink for DiscardAuditSink {
    fn write<'a>(&'a self, _entry: &'a AuditEntry) -> AuditFuture<'a> {
        Box::pin(async { Ok(()) })
    }
}
