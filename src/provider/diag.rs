//! Diagnostics returned by every resource operation
//!
//! An empty list means success. Each failure produces exactly one record.

use super::error::ProviderError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.severity, self.summary)
    }
}

pub type Diagnostics = Vec<Diagnostic>;

/// One error diagnostic carrying the error's message
pub fn from_error(err: &ProviderError) -> Diagnostics {
    tracing::debug!("operation failed: {}", err);
    vec![Diagnostic::error(err.to_string())]
}

/// Diagnostic for an identifier that could not be decoded
pub fn from_malformed_identifier(literal: &str) -> Diagnostics {
    from_error(&ProviderError::MalformedIdentifier(literal.to_string()))
}

/// Collapse a handler result into the diagnostics it reports
pub fn from_result(result: Result<(), ProviderError>) -> Diagnostics {
    match result {
        Ok(()) => Vec::new(),
        Err(err) => from_error(&err),
    }
}
