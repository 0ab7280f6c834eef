use super::{AuditEntry, AuditFuture, AuditSink};
use crate::error::AuditError;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// Request timeout applied by the HTTP client itself
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts audit entries as JSON to a logging endpoint
///
/// The endpoint receives one `POST` per entry with the camelCase wire format of
/// [`AuditEntry`]. Any non-success status is reported as [`AuditError::Rejected`].
pub struct HttpAuditSink {
    client: Client,
    endpoint: String,
}

impl HttpAuditSink {
    /// Create a new HTTP audit sink
    ///
    /// # Arguments
    /// * `endpoint` - URL that accepts audit entries (e.g., "http://localhost:8080/audit")
    ///
    /// # Example
    /// ```
    /// use triage::audit::HttpAuditSink;
    ///
    /// let sink = HttpAuditSink::new("http://localhost:8080/audit".to_string()).unwrap();
    /// assert_eq!(sink.endpoint(), "http://localhost:8080/audit");
    /// ```
    pub fn new(endpoint: String) -> Result<Self, AuditError> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .no_proxy()
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        debug!("Posting audit entry to {}", self.endpoint);

        let response = self.client.post(&self.endpoint).json(entry).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl AuditSink for HttpAuditSink {
    fn write<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a> {
        Box::pin(self.post(entry))
    }
}
