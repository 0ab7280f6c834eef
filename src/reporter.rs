//! Entry facade
//!
//! [`ErrorReporter::report`] is the single call surface the rest of an application
//! uses to report a failure: classify, dispatch to both sinks, hand the normalized
//! record back. It never fails. The guarded wrappers build on it for backend calls
//! and HTTP fetches, re-signaling the normalized record as their error.

use crate::audit::AuditSink;
use crate::classifier::{Classifier, RawFailure};
use crate::dispatch::DispatchCoordinator;
use crate::notify::NotifyTarget;
use crate::record::NormalizedError;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Classifies failures and routes them to the configured sinks
#[derive(Clone)]
pub struct ErrorReporter {
    classifier: Classifier,
    coordinator: DispatchCoordinator,
}

impl ErrorReporter {
    pub fn new(classifier: Classifier, coordinator: DispatchCoordinator) -> Self {
        Self {
            classifier,
            coordinator,
        }
    }

    /// Reporter with the static severity table and default notification settings
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use triage::audit::MockAuditSink;
    /// use triage::notify::NotifyTarget;
    /// use triage::record::ErrorKind;
    /// use triage::reporter::ErrorReporter;
    ///
    /// let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    /// let reporter = ErrorReporter::with_audit(Arc::new(MockAuditSink::new()));
    /// let record = runtime.block_on(reporter.report("Simple string failure", &NotifyTarget::Detached, None));
    /// assert_eq!(record.kind, ErrorKind::StringError);
    /// ```
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self::new(Classifier::default(), DispatchCoordinator::new(audit))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn coordinator(&self) -> &DispatchCoordinator {
        &self.coordinator
    }

    /// Report a failure and return its normalized record
    ///
    /// # Arguments
    ///
    /// * `raw` - The failure value
    /// * `target` - Where the notification goes
    /// * `context` - Origin label of the failing component or operation
    pub async fn report(
        &self,
        raw: impl Into<RawFailure>,
        target: &NotifyTarget,
        context: Option<&str>,
    ) -> NormalizedError {
        self.report_for_record(raw, target, context, None).await
    }

    /// Report a failure tied to a specific record identifier
    pub async fn report_for_record(
        &self,
        raw: impl Into<RawFailure>,
        target: &NotifyTarget,
        context: Option<&str>,
        record_id: Option<&str>,
    ) -> NormalizedError {
        let raw = raw.into();
        let record = self.classifier.classify(&raw, context.unwrap_or_default());
        self.coordinator
            .dispatch_for_record(&record, target, record_id)
            .await;
        record
    }

    /// Await a fallible call, reporting its failure
    ///
    /// Success passes through untouched. On failure the error is reported and the
    /// normalized record is returned as the error so the caller can decide whether
    /// to propagate it further.
    pub async fn guard<T, E, F>(
        &self,
        call: F,
        target: &NotifyTarget,
        context: Option<&str>,
    ) -> Result<T, NormalizedError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        match call.await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.report(error, target, context).await),
        }
    }

    /// Send an HTTP request, reporting transport failures and non-success statuses
    ///
    /// JSON responses are parsed; any other content type is returned as a string.
    pub async fn fetch(
        &self,
        request: RequestBuilder,
        target: &NotifyTarget,
        context: Option<&str>,
    ) -> Result<Value, NormalizedError> {
        self.guard(send_request(request), target, context).await
    }
}

async fn send_request(request: RequestBuilder) -> Result<Value, RawFailure> {
    let response = request.send().await?;
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);

    debug!("Fetched {} with status {}", response.url(), status);

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let data = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(RawFailure::from_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            data,
        ));
    }

    let text = response.text().await?;
    if is_json {
        serde_json::from_str(&text).map_err(|e| RawFailure::from_error(&e))
    } else {
        Ok(Value::String(text))
    }
}
