//! triage: error normalization and dual-sink dispatch
//!
//! Any failure value (runtime fault, backend error body, network response, plain
//! string, arbitrary object, nothing at all) is classified into a single
//! [`NormalizedError`] record, shown to the user through a notification target and
//! written to an audit sink. Reporting never fails.

/// Error types for the sinks and configuration
pub mod error;

/// Normalized error record, kinds and severities
pub mod record;

/// Kind to severity mapping
pub mod severity;

/// Failure shape detection and normalization
pub mod classifier;

/// Notification targets and notifiers
pub mod notify;

/// Audit entry and audit sinks
pub mod audit;

/// Fan-out of records to both sinks
pub mod dispatch;

/// Entry facade and guarded calls
pub mod reporter;

/// Named component error boundary
pub mod boundary;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use boundary::ErrorBoundary;
pub use classifier::{classify, RawFailure};
pub use error::{AuditError, ConfigError, NotifyError};
pub use record::{ErrorKind, NormalizedError, Severity};
pub use reporter::ErrorReporter;
