//! Severity policy: static kind → severity table with optional overrides

use crate::error::ConfigError;
use crate::record::{ErrorKind, Severity};
use std::collections::HashMap;

/// Declared severity per kind. Add a row to teach the policy a new kind.
pub const SEVERITY_TABLE: &[(&str, Severity)] = &[
    ("runtime_fault", Severity::Error),
    ("backend_error", Severity::Error),
    ("aggregate", Severity::Warning),
    ("network_error", Severity::Error),
    ("string_error", Severity::Info),
    ("object_error", Severity::Error),
    ("unknown", Severity::Error),
];

/// Severity applied to any kind the table has never seen
pub const DEFAULT_SEVERITY: Severity = Severity::Error;

/// Look up the declared severity for a kind in the static table
pub fn severity_for(kind: &ErrorKind) -> Severity {
    lookup(SEVERITY_TABLE.iter().map(|(tag, severity)| (*tag, *severity)), kind)
        .unwrap_or(DEFAULT_SEVERITY)
}

fn lookup<'a>(
    mut rows: impl Iterator<Item = (&'a str, Severity)>,
    kind: &ErrorKind,
) -> Option<Severity> {
    let tag = kind.as_str();
    rows.find(|(row, _)| row.eq_ignore_ascii_case(tag))
        .map(|(_, severity)| severity)
}

/// Severity table with configured rows layered over [`SEVERITY_TABLE`]
///
/// Overrides may replace a built-in row or add rows for backend codes. Lookups stay
/// total: anything unmapped resolves to [`DEFAULT_SEVERITY`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityPolicy {
    overrides: HashMap<String, Severity>,
}

impl SeverityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the row for `kind`
    pub fn with_override(mut self, kind: &str, severity: Severity) -> Self {
        self.overrides.insert(kind.trim().to_ascii_lowercase(), severity);
        self
    }

    /// Build a policy from configured `kind = "severity"` pairs
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if a value does not name a severity.
    pub fn from_overrides(overrides: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut policy = Self::new();
        for (kind, name) in overrides {
            let severity = Severity::parse(name).ok_or_else(|| {
                ConfigError::ParseError(format!(
                    "unknown severity '{}' for kind '{}' (expected info, warning or error)",
                    name, kind
                ))
            })?;
            policy = policy.with_override(kind, severity);
        }
        Ok(policy)
    }

    /// Resolve the severity for a kind, consulting overrides first
    pub fn severity_for(&self, kind: &ErrorKind) -> Severity {
        lookup(
            self.overrides
                .iter()
                .map(|(tag, severity)| (tag.as_str(), *severity)),
            kind,
        )
        .unwrap_or_else(|| severity_for(kind))
    }

    /// Number of configured override rows
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}
