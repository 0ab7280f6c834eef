//! Configuration loading
//!
//! Settings come from a TOML file. Every section has defaults, so an empty file
//! (or no file at all) yields a console notifier with a discarding audit sink.

use crate::audit::{AuditSink, DiscardAuditSink, FileAuditSink, HttpAuditSink};
use crate::classifier::Classifier;
use crate::dispatch::DispatchCoordinator;
use crate::error::ConfigError;
use crate::notify::{
    ConsoleNotifier, DesktopNotifier, NotificationMode, NotifyTarget, DEFAULT_TITLE,
};
use crate::reporter::ErrorReporter;
use crate::severity::SeverityPolicy;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default location of the JSON-lines audit file
pub const DEFAULT_AUDIT_PATH: &str = "triage-audit.jsonl";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub severity: SeverityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub mode: NotificationMode,
    pub target: TargetKind,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            mode: NotificationMode::default(),
            target: TargetKind::default(),
        }
    }
}

/// Where notifications are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Console,
    Desktop,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub sink: SinkKind,
    pub path: PathBuf,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            path: PathBuf::from(DEFAULT_AUDIT_PATH),
            endpoint: None,
            timeout_seconds: None,
        }
    }
}

/// Where audit entries are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    File,
    Http,
    #[default]
    None,
}

/// Extra or replacement rows for the severity table, keyed by kind tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub overrides: HashMap<String, String>,
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// `ConfigError::ReadError` when the file cannot be read, `ConfigError::TomlError`
    /// when it is not valid TOML, `ConfigError::ValidationError` for bad values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification.title.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "notification.title must not be empty".to_string(),
            ));
        }

        match self.audit.sink {
            SinkKind::Http => {
                let endpoint = self.audit.endpoint.as_deref().unwrap_or_default();
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "audit.endpoint must be an http(s) URL, got '{}'",
                        endpoint
                    )));
                }
            }
            SinkKind::File => {
                if self.audit.path.as_os_str().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "audit.path must not be empty for the file sink".to_string(),
                    ));
                }
            }
            SinkKind::None => {}
        }

        if self.audit.timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "audit.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // Surfaces unknown severity names at load time
        SeverityPolicy::from_overrides(&self.severity.overrides)?;

        Ok(())
    }

    pub fn audit_timeout(&self) -> Option<Duration> {
        self.audit.timeout_seconds.map(Duration::from_secs)
    }

    pub fn build_target(&self) -> NotifyTarget {
        match self.notification.target {
            TargetKind::Console => NotifyTarget::dispatcher(ConsoleNotifier::new()),
            TargetKind::Desktop => NotifyTarget::dispatcher(DesktopNotifier::new()),
            TargetKind::None => NotifyTarget::Detached,
        }
    }

    pub fn build_audit_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        let sink: Arc<dyn AuditSink> = match self.audit.sink {
            SinkKind::File => Arc::new(FileAuditSink::new(self.audit.path.clone())),
            SinkKind::Http => {
                let endpoint = self.audit.endpoint.clone().ok_or_else(|| {
                    ConfigError::ValidationError("audit.endpoint is required".to_string())
                })?;
                Arc::new(HttpAuditSink::new(endpoint)?)
            }
            SinkKind::None => Arc::new(DiscardAuditSink),
        };
        Ok(sink)
    }

    /// Assemble a reporter wired to the configured sinks and severity overrides
    pub fn build_reporter(&self) -> Result<ErrorReporter, ConfigError> {
        let policy = SeverityPolicy::from_overrides(&self.severity.overrides)?;
        debug!(
            "Building reporter: target={:?}, sink={:?}, {} severity override(s)",
            self.notification.target,
            self.audit.sink,
            policy.override_count()
        );

        let coordinator = DispatchCoordinator::new(self.build_audit_sink()?)
            .with_title(self.notification.title.clone())
            .with_mode(self.notification.mode)
            .with_audit_timeout(self.audit_timeout());

        Ok(ErrorReporter::new(Classifier::new(policy), coordinator))
    }
}
