// crates/flow-regtest-core/src/report.rs
// ============================================================================
// Module: Check Reporting
// Description: Outcome sinks and the per-check pass/fail tally.
// Purpose: Record every check outcome exactly once across virtual users.
// Dependencies: serde, crate::checks
// ============================================================================

//! ## Overview
//! The checking facility receives each [`CheckOutcome`] once. [`CheckTally`]
//! aggregates outcomes per qualified check name behind a mutex so concurrent
//! virtual users can share it, and produces a serializable [`RunSummary`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;

use crate::checks::CheckOutcome;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for check outcomes.
pub trait CheckSink: Send + Sync {
    /// Record one outcome.
    fn record(&self, outcome: &CheckOutcome);
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pass/fail counters for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCount {
    /// Number of passing evaluations.
    pub passed: u64,
    /// Number of failing evaluations.
    pub failed: u64,
}

/// Aggregated outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total passing evaluations.
    pub total_passed: u64,
    /// Total failing evaluations.
    pub total_failed: u64,
    /// Counters keyed by qualified check name.
    pub checks: BTreeMap<String, CheckCount>,
}

impl RunSummary {
    /// Returns true when no evaluation failed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.total_failed == 0
    }

    /// Returns the names of checks that failed at least once.
    #[must_use]
    pub fn failing(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, count)| count.failed > 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Thread-safe tally of check outcomes.
#[derive(Debug, Default)]
pub struct CheckTally {
    /// Counters keyed by qualified check name.
    counts: Mutex<BTreeMap<String, CheckCount>>,
}

impl CheckTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a summary snapshot of everything recorded so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let checks = self.counts.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let total_passed = checks.values().map(|count| count.passed).sum();
        let total_failed = checks.values().map(|count| count.failed).sum();
        RunSummary {
            total_passed,
            total_failed,
            checks,
        }
    }
}

impl CheckSink for CheckTally {
    fn record(&self, outcome: &CheckOutcome) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(outcome.name.clone()).or_default();
        if outcome.passed {
            count.passed += 1;
        } else {
            count.failed += 1;
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
