//! Reporting channel for unit-scoped failures
//!
//! Parse failures, unreadable files and undecodable store records are not
//! errors for the surrounding batch. They are handed to a [`DiagnosticsSink`]
//! as `(source_id, message)` pairs and processing continues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// What went wrong for a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Source text is not valid Python
    Parse,
    /// A record returned by the store could not be decoded
    Decode,
    /// A source file could not be read as UTF-8 text
    Read,
}

/// A single reported failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source_id: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source_id: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Decode => "decode",
            DiagnosticKind::Read => "read",
        };
        write!(f, "[{}] {}: {}", kind, self.source_id, self.message)
    }
}

/// Fire-and-forget receiver of diagnostics
///
/// Implementations must not block; extraction runs on rayon workers and
/// reports from several threads at once.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that writes every diagnostic to the `tracing` log at `warn` level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            source_id = %diagnostic.source_id,
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.message
        );
    }
}

/// Sink that buffers diagnostics so callers can inspect them afterwards
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything reported so far, leaving the sink empty
    pub fn drain(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        match self.diagnostics.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!("Collected diagnostic: {}", diagnostic);
        match self.diagnostics.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
