//! Error boundary for named components
//!
//! A boundary wraps risky work for one component. When the work fails or panics it
//! reports the failure with the component name as context and flips its
//! `has_error` flag so the owner can switch to a fallback view.

use crate::classifier::RawFailure;
use crate::notify::NotifyTarget;
use crate::record::NormalizedError;
use crate::reporter::ErrorReporter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Component name used when none is given
pub const UNKNOWN_COMPONENT: &str = "Unknown";

pub struct ErrorBoundary {
    component_name: String,
    has_error: bool,
    reporter: Arc<ErrorReporter>,
    target: NotifyTarget,
}

impl ErrorBoundary {
    pub fn new(
        component_name: impl Into<String>,
        reporter: Arc<ErrorReporter>,
        target: NotifyTarget,
    ) -> Self {
        let component_name = component_name.into();
        Self {
            component_name: if component_name.trim().is_empty() {
                UNKNOWN_COMPONENT.to_string()
            } else {
                component_name
            },
            has_error: false,
            reporter,
            target,
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Clear the error flag, e.g. after the user retries
    pub fn reset(&mut self) {
        self.has_error = false;
    }

    /// Report a failure caught by the owning component
    pub async fn catch_error(&mut self, raw: impl Into<RawFailure>) -> NormalizedError {
        self.has_error = true;
        self.reporter
            .report(raw, &self.target, Some(&self.component_name))
            .await
    }

    /// Run synchronous work inside the boundary
    ///
    /// Returns `Some` with the work's value on success. An `Err` result or a panic
    /// is reported and yields `None`.
    pub async fn run<T, E, F>(&mut self, work: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<RawFailure>,
    {
        let raw = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(error)) => error.into(),
            Err(payload) => RawFailure::from_panic(payload.as_ref()),
        };

        self.catch_error(raw).await;
        None
    }
}
