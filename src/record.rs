//! Core record types for the error pipeline
//!
//! This module defines the normalized error record every failure is converted into,
//! together with the classification tag and presentation severity it carries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Fallback message used when nothing better can be derived from a failure
pub const DEFAULT_UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Fallback message for network failures without a status text or payload
pub const DEFAULT_NETWORK_MESSAGE: &str = "A network error occurred. Please try again later.";

/// Fallback message for backend failures without a usable body
pub const DEFAULT_SERVER_MESSAGE: &str = "A server error occurred. Please contact support.";

/// Fallback message for local runtime faults without a message
pub const DEFAULT_FAULT_MESSAGE: &str =
    "A client-side error occurred. Please try again or contact support.";

/// Fallback message for an aggregate failure whose sub-errors carried no text
pub const DEFAULT_AGGREGATE_MESSAGE: &str = "One or more errors occurred";

/// Classification tag identifying the origin or shape of a failure
///
/// The named variants form the closed set produced by the classifier. Codes supplied
/// by a backend (`errorCode` or `status` fields) that do not name one of them are
/// carried verbatim in [`ErrorKind::Code`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Local runtime fault (a Rust error value or a caught panic)
    RuntimeFault,
    /// Backend call failure without its own error code
    BackendError,
    /// Several sub-errors reported together
    Aggregate,
    /// Failed network response carrying a status code
    NetworkError,
    /// Plain string failure
    StringError,
    /// Generic object failure
    ObjectError,
    /// Nothing recognizable
    Unknown,
    /// Opaque backend-supplied code
    Code(String),
}

/// Canonical tags of the closed kind set, in declaration order
const KIND_TAGS: &[(&str, ErrorKind)] = &[
    ("runtime_fault", ErrorKind::RuntimeFault),
    ("backend_error", ErrorKind::BackendError),
    ("aggregate", ErrorKind::Aggregate),
    ("network_error", ErrorKind::NetworkError),
    ("string_error", ErrorKind::StringError),
    ("object_error", ErrorKind::ObjectError),
    ("unknown", ErrorKind::Unknown),
];

impl ErrorKind {
    /// Resolve a backend-supplied code into a kind
    ///
    /// Codes naming a member of the closed set (case-insensitive) map onto that
    /// member so its declared severity applies; anything else stays opaque.
    pub fn from_code(code: &str) -> Self {
        let trimmed = code.trim();
        KIND_TAGS
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(trimmed))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| ErrorKind::Code(trimmed.to_string()))
    }

    /// The tag used for this kind in logs, audit entries and severity lookups
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::RuntimeFault => "runtime_fault",
            ErrorKind::BackendError => "backend_error",
            ErrorKind::Aggregate => "aggregate",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::StringError => "string_error",
            ErrorKind::ObjectError => "object_error",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Code(code) => code,
        }
    }

    /// Whether this kind belongs to the closed set rather than being a backend code
    pub fn is_builtin(&self) -> bool {
        !matches!(self, ErrorKind::Code(_))
    }

    /// Message used when classification could not derive any text
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::RuntimeFault => DEFAULT_FAULT_MESSAGE,
            ErrorKind::BackendError => DEFAULT_SERVER_MESSAGE,
            ErrorKind::Aggregate => DEFAULT_AGGREGATE_MESSAGE,
            ErrorKind::NetworkError => DEFAULT_NETWORK_MESSAGE,
            _ => DEFAULT_UNKNOWN_MESSAGE,
        }
    }

    /// All members of the closed kind set
    pub fn builtin() -> impl Iterator<Item = ErrorKind> {
        KIND_TAGS.iter().map(|(_, kind)| kind.clone())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorKind::from_code(&code))
    }
}

/// Presentation urgency of a record, drives notification styling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// May require attention
    Warning,
    /// Something failed
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Parse a severity name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single typed shape every failure is converted into
///
/// A record is always fully populated: `message` is never empty, `trace` and
/// `context` are empty strings rather than absent. It implements [`std::error::Error`]
/// so a caller can hand it upward with `?` after it has been reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct NormalizedError {
    /// Classification tag
    pub kind: ErrorKind,
    /// Human-readable message, never empty
    pub message: String,
    /// Diagnostic trace text, empty when unavailable
    pub trace: String,
    /// Presentation severity derived from `kind`
    pub severity: Severity,
    /// Caller-supplied origin label, empty when omitted
    pub context: String,
}

impl NormalizedError {
    /// Assemble a record, substituting the kind's default message for empty text
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        trace: impl Into<String>,
        severity: Severity,
        context: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.default_message().to_string()
        } else {
            message
        };

        Self {
            kind,
            message,
            trace: trace.into(),
            severity,
            context: context.into(),
        }
    }

    /// The record produced for absent or unrecognizable input
    pub fn unknown(context: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Unknown,
            DEFAULT_UNKNOWN_MESSAGE,
            "",
            Severity::Error,
            context,
        )
    }

    /// Trace text for sinks that distinguish "no trace" from an empty one
    pub fn trace_opt(&self) -> Option<&str> {
        if self.trace.is_empty() {
            None
        } else {
            Some(&self.trace)
        }
    }
}
