// crates/flow-regtest-cli/src/artifacts.rs
// ============================================================================
// Module: Run Artifacts
// Description: Per-run artifact directory and summary writers.
// Purpose: Persist a deterministic JSON summary and a readable Markdown one.
// Dependencies: serde, serde_jcs, flow-regtest-core
// ============================================================================

//! ## Overview
//! Each invocation writes into `{run_root}/run-{nonce}`. `summary.json` uses
//! canonical JCS serialization so two summaries of identical runs are
//! byte-identical apart from timestamps. `diagnostics.jsonl` sits next to it
//! unless another path was configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use flow_regtest_core::RunNonce;
use flow_regtest_core::RunSummary;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Artifact root used when neither the CLI nor config names one.
pub const DEFAULT_RUN_ROOT: &str = "target/flow-regtest";

/// Default diagnostics file name inside the run directory.
pub const DIAGNOSTICS_FILE: &str = "diagnostics.jsonl";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Machine-readable summary of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Process nonce shared by every virtual user.
    pub nonce: String,
    /// Concurrent virtual users.
    pub virtual_users: u32,
    /// Iterations per virtual user.
    pub iterations: u32,
    /// Runs that finished (pass or fail).
    pub completed_runs: u64,
    /// Start time in milliseconds since the epoch.
    pub started_at_ms: u64,
    /// End time in milliseconds since the epoch.
    pub ended_at_ms: u64,
    /// Aggregated check outcomes.
    pub summary: RunSummary,
}

impl RunReport {
    /// Returns `passed` or `failed`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.summary.all_passed() { "passed" } else { "failed" }
    }
}

/// Artifact directory for one invocation.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Directory holding every artifact of this run.
    root: PathBuf,
}

impl RunArtifacts {
    /// Creates `{run_root}/run-{nonce}`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created.
    pub fn create(run_root: &Path, nonce: &RunNonce) -> io::Result<Self> {
        let root = run_root.join(format!("run-{nonce}"));
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Returns the run directory.
    #[must_use]
    #[cfg_attr(not(test), expect(dead_code, reason = "only exercised by unit tests"))]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the default diagnostics path.
    #[must_use]
    pub fn diagnostics_path(&self) -> PathBuf {
        self.root.join(DIAGNOSTICS_FILE)
    }

    /// Writes `summary.json` and `summary.md`, returning both paths.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when serialization or a write fails.
    pub fn write_summary(&self, report: &RunReport) -> io::Result<[PathBuf; 2]> {
        let json = self.root.join("summary.json");
        let bytes = serde_jcs::to_vec(report).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&json, bytes)?;
        let markdown = self.root.join("summary.md");
        fs::write(&markdown, summary_markdown(report).as_bytes())?;
        Ok([json, markdown])
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch; zero if the clock is before it.
///
/// JCS has no representation for 128-bit integers, so the value saturates at
/// `u64::MAX`.
#[must_use]
pub fn now_millis() -> u64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Renders the Markdown summary.
#[must_use]
pub fn summary_markdown(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    out.push_str("# Flow Regression Summary\n\n");
    out.push_str("## Status\n\n");
    let _ = writeln!(out, "- Status: {}", report.status());
    let _ = writeln!(out, "- Nonce: {}", report.nonce);
    let _ = writeln!(out, "- Virtual users: {}", report.virtual_users);
    let _ = writeln!(out, "- Iterations: {}", report.iterations);
    let _ = writeln!(out, "- Completed runs: {}", report.completed_runs);
    let _ = writeln!(out, "- Checks passed: {}", summary.total_passed);
    let _ = writeln!(out, "- Checks failed: {}", summary.total_failed);
    let _ = writeln!(
        out,
        "- Duration (ms): {}",
        report.ended_at_ms.saturating_sub(report.started_at_ms)
    );
    out.push_str("\n## Failing Checks\n\n");
    let failing = summary.failing();
    if failing.is_empty() {
        out.push_str("- None\n");
    } else {
        for name in failing {
            let count = summary.checks.get(name).map_or(0, |count| count.failed);
            let _ = writeln!(out, "- {name} ({count} failed)");
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
