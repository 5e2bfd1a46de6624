// crates/flow-regtest-core/src/diagnostics.rs
// ============================================================================
// Module: Check Diagnostics
// Description: Failure diagnostics and the sinks that emit them.
// Purpose: Make failed checks diagnosable from logs alone.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A failed check produces exactly one [`DiagnosticRecord`]. The text form is
//! a single line led by a marker: `[*]` when the predicate returned `false`,
//! `[!]` when it raised. Log scrapers key on the marker.
//!
//! Sinks mirror the audit sinks used elsewhere: stderr lines, append-only
//! JSON lines on disk, an in-memory buffer for tests, and a no-op sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Distinguishes a predicate returning `false` from a predicate raising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticMarker {
    /// Predicate evaluated cleanly to `false`.
    ReturnedFalse,
    /// Predicate raised, or there was no response to evaluate.
    Raised,
}

impl DiagnosticMarker {
    /// Returns the log-line marker.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReturnedFalse => "[*]",
            Self::Raised => "[!]",
        }
    }
}

/// Diagnostic payload attached to a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDiagnostic {
    /// Failure marker.
    pub marker: DiagnosticMarker,
    /// Check name, qualified by its group path.
    pub name: String,
    /// Rendered response content.
    pub detail: String,
    /// Raised error text; present only for [`DiagnosticMarker::Raised`].
    pub error: Option<String>,
}

impl CheckDiagnostic {
    /// Builds a diagnostic, deriving the marker from the presence of an error.
    #[must_use]
    pub fn new(name: impl Into<String>, detail: impl Into<String>, error: Option<String>) -> Self {
        let marker = if error.is_some() {
            DiagnosticMarker::Raised
        } else {
            DiagnosticMarker::ReturnedFalse
        };
        Self {
            marker,
            name: name.into(),
            detail: detail.into(),
            error,
        }
    }
}

impl fmt::Display for CheckDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => {
                write!(f, "{} {}: {}: {error}", self.marker.as_str(), self.name, self.detail)
            }
            None => write!(f, "{} {}: {}", self.marker.as_str(), self.name, self.detail),
        }
    }
}

/// Diagnostic event written by sinks.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// Virtual user number when the check ran inside a run.
    pub virtual_user: Option<u32>,
    /// Iteration number when the check ran inside a run.
    pub iteration: Option<u32>,
    /// The diagnostic itself.
    #[serde(flatten)]
    pub diagnostic: CheckDiagnostic,
}

impl DiagnosticRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        virtual_user: Option<u32>,
        iteration: Option<u32>,
        diagnostic: CheckDiagnostic,
    ) -> Self {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let timestamp_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        Self {
            event: "check_failed",
            timestamp_ms,
            virtual_user,
            iteration,
            diagnostic,
        }
    }

    /// Renders the single-line text form, prefixed with the virtual user.
    #[must_use]
    pub fn line(&self) -> String {
        match (self.virtual_user, self.iteration) {
            (Some(user), Some(iteration)) => {
                format!("vu={user} it={iteration} {}", self.diagnostic)
            }
            _ => self.diagnostic.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for check failure diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn record(&self, record: &DiagnosticRecord);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that writes marker lines to stderr.
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    fn record(&self, record: &DiagnosticRecord) {
        let _ = writeln!(std::io::stderr(), "{}", record.line());
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileDiagnosticSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileDiagnosticSink {
    /// Opens the diagnostics file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record(&self, record: &DiagnosticRecord) {
        if let Ok(payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryDiagnosticSink {
    /// Captured records in emission order.
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl MemoryDiagnosticSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured records.
    #[must_use]
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().map_or_else(|_| Vec::new(), |records| records.clone())
    }

    /// Returns captured records rendered as text lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(DiagnosticRecord::line).collect()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn record(&self, record: &DiagnosticRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Sink that forwards each record to several sinks.
pub struct FanoutDiagnosticSink {
    /// Downstream sinks, called in order.
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl FanoutDiagnosticSink {
    /// Creates a fan-out over the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn DiagnosticSink>>) -> Self {
        Self {
            sinks,
        }
    }
}

impl DiagnosticSink for FanoutDiagnosticSink {
    fn record(&self, record: &DiagnosticRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }
}

/// No-op diagnostic sink.
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn record(&self, _record: &DiagnosticRecord) {}
}
