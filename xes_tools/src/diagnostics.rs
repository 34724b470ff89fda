//! Sinks for non-fatal messages produced while parsing XES
//!
//! The importer never writes to stdout/stderr itself. Instead, a [`DiagnosticSink`] is passed into the
//! parse and receives every recoverable oddity (unknown attribute types, unparseable numbers, ...).

use std::fmt;

/// Severity of a [`Diagnostic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Informational message
    Info,
    /// Something in the input was skipped or replaced by a default
    Warning,
}

/// A single message reported during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub level: DiagnosticLevel,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new [`DiagnosticLevel::Warning`] diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    /// Create a new [`DiagnosticLevel::Info`] diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            DiagnosticLevel::Info => write!(f, "info: {}", self.message),
            DiagnosticLevel::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// Receiver of [`Diagnostic`]s
pub trait DiagnosticSink {
    /// Handle one diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to [`tracing`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Info => tracing::info!(target: "xes_tools::import", "{}", diagnostic.message),
            DiagnosticLevel::Warning => {
                tracing::warn!(target: "xes_tools::import", "{}", diagnostic.message)
            }
        }
    }
}

/// Drops all diagnostics
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl DiagnosticSink for DiscardSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
