use std::time::Duration;
use thiserror::Error;

/// Errors raised while delivering a notification to the presentation sink
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("Notification target panicked: {0}")]
    TargetPanicked(String),
}

/// Errors raised by audit sinks
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit endpoint rejected entry with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Audit write timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to serialize audit entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Audit sink failure: {0}")]
    SinkFailed(String),

    #[error("Audit sink panicked: {0}")]
    SinkPanicked(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to build audit sink: {0}")]
    AuditSinkError(#[from] AuditError),
}
