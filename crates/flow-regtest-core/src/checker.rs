// crates/flow-regtest-core/src/checker.rs
// ============================================================================
// Module: Checker
// Description: Group-scoped facade over check evaluation and recording.
// Purpose: Give phases one handle for checks, groups, and context guards.
// Dependencies: crate::{checks, diagnostics, report}
// ============================================================================

//! ## Overview
//! A [`Checker`] carries the outcome sink, the diagnostic sink, and the scope
//! (virtual user, iteration, group path). [`Checker::group`] returns a nested
//! checker; groups only qualify check names and never change verdicts.
//!
//! [`Checker::require`] turns a harness error (usually a missing context
//! field after an upstream failure) into an ordinary failed check so the
//! cascade stays visible in the tally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;
use std::sync::Arc;

use crate::checks::CheckOutcome;
use crate::checks::CheckScope;
use crate::checks::CheckSet;
use crate::checks::GuardedCheckSet;
use crate::checks::NO_RESPONSE_DETAIL;
use crate::diagnostics::CheckDiagnostic;
use crate::diagnostics::DiagnosticRecord;
use crate::diagnostics::DiagnosticSink;
use crate::report::CheckSink;
use crate::response::Exchange;

// ============================================================================
// SECTION: Checker
// ============================================================================

/// Scoped handle for evaluating and recording checks.
#[derive(Clone)]
pub struct Checker {
    /// Receives every outcome exactly once.
    sink: Arc<dyn CheckSink>,
    /// Receives failure diagnostics.
    diagnostics: Arc<dyn DiagnosticSink>,
    /// Current scope.
    scope: CheckScope,
}

impl Checker {
    /// Creates a root checker for one run.
    #[must_use]
    pub fn new(
        sink: Arc<dyn CheckSink>,
        diagnostics: Arc<dyn DiagnosticSink>,
        virtual_user: Option<u32>,
        iteration: Option<u32>,
    ) -> Self {
        Self {
            sink,
            diagnostics,
            scope: CheckScope {
                virtual_user,
                iteration,
                groups: Vec::new(),
            },
        }
    }

    /// Returns a checker nested one group deeper.
    #[must_use]
    pub fn group(&self, name: impl Into<String>) -> Self {
        let mut nested = self.clone();
        nested.scope.groups.push(name.into());
        nested
    }

    /// Returns the current scope.
    #[must_use]
    pub const fn scope(&self) -> &CheckScope {
        &self.scope
    }

    /// Guards `checks` with the diagnostic sink, evaluates them, and records
    /// every outcome. Returns true when all checks passed.
    pub fn check(&self, exchange: &Exchange, checks: CheckSet) -> bool {
        let guarded = checks.with_log(Arc::clone(&self.diagnostics));
        self.check_guarded(exchange, &guarded)
    }

    /// Evaluates an already guarded set and records every outcome.
    pub fn check_guarded(&self, exchange: &Exchange, checks: &GuardedCheckSet) -> bool {
        let outcomes = checks.evaluate(exchange, &self.scope);
        let mut all_passed = true;
        for outcome in &outcomes {
            self.sink.record(outcome);
            all_passed &= outcome.passed;
        }
        all_passed
    }

    /// Records `name` as passed when `result` is `Ok`, otherwise as a raised
    /// failure carrying the error text.
    pub fn require<T, E: Display>(&self, name: &str, result: Result<T, E>) -> Option<T> {
        let qualified = self.scope.qualify(name);
        match result {
            Ok(value) => {
                self.sink.record(&CheckOutcome {
                    name: qualified,
                    passed: true,
                    diagnostic: None,
                });
                Some(value)
            }
            Err(err) => {
                let diagnostic = CheckDiagnostic::new(
                    qualified.clone(),
                    NO_RESPONSE_DETAIL,
                    Some(err.to_string()),
                );
                self.diagnostics.record(&DiagnosticRecord::new(
                    self.scope.virtual_user,
                    self.scope.iteration,
                    diagnostic.clone(),
                ));
                self.sink.record(&CheckOutcome {
                    name: qualified,
                    passed: false,
                    diagnostic: Some(diagnostic),
                });
                None
            }
        }
    }
}
