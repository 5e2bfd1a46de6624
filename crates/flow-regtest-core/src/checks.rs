// crates/flow-regtest-core/src/checks.rs
// ============================================================================
// Module: Guarded Checks
// Description: Named predicates and the logging wrapper around them.
// Purpose: Turn every predicate into a self-diagnosing check.
// Dependencies: crate::{diagnostics, response}
// ============================================================================

//! ## Overview
//! A [`CheckSet`] maps check names to predicates over an [`ApiResponse`].
//! Predicates return `Result<bool, PredicateError>`: `Ok(false)` is an
//! ordinary failure and `Err` is the raised channel.
//!
//! [`CheckSet::with_log`] consumes the set and builds a new
//! [`GuardedCheckSet`]. The guarded form cannot be wrapped again, so a check
//! never logs twice. Guarding changes no verdict: the boolean that comes out
//! is the boolean the predicate produced, with raised errors and missing
//! responses resolving to `false`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::CheckDiagnostic;
use crate::diagnostics::DiagnosticRecord;
use crate::diagnostics::DiagnosticSink;
use crate::response::ApiResponse;
use crate::response::Exchange;
use crate::response::PredicateError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Boxed predicate over a buffered response.
pub type Predicate = Box<dyn Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync>;

/// Placeholder detail used when no response exists to describe.
pub const NO_RESPONSE_DETAIL: &str = "<no response>";

/// Where a check runs: virtual user, iteration, and group path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckScope {
    /// Virtual user number.
    pub virtual_user: Option<u32>,
    /// Iteration number for the virtual user.
    pub iteration: Option<u32>,
    /// Nested group names, outermost first.
    pub groups: Vec<String>,
}

impl CheckScope {
    /// Qualifies a check name with the group path (`a > b > name`).
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        if self.groups.is_empty() {
            return name.to_string();
        }
        format!("{} > {name}", self.groups.join(" > "))
    }
}

/// Result of evaluating one check against one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Check name qualified by its group path.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Failure diagnostic; `None` when the check passed.
    pub diagnostic: Option<CheckDiagnostic>,
}

/// Ordered mapping of check name to predicate.
///
/// Re-using a name replaces the earlier predicate in place.
#[derive(Default)]
pub struct CheckSet {
    /// Named predicates in insertion order.
    entries: Vec<(String, Predicate)>,
}

impl fmt::Debug for CheckSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckSet").field("names", &self.names()).finish()
    }
}

impl CheckSet {
    /// Creates an empty check set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named predicate.
    #[must_use]
    pub fn check<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        let name = name.into();
        let predicate: Predicate = Box::new(predicate);
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = predicate,
            None => self.entries.push((name, predicate)),
        }
        self
    }

    /// Returns the check names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the set holds no checks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wraps every predicate so failures are logged to `sink`.
    #[must_use]
    pub fn with_log(self, sink: Arc<dyn DiagnosticSink>) -> GuardedCheckSet {
        let checks = self
            .entries
            .into_iter()
            .map(|(name, predicate)| GuardedCheck {
                name,
                predicate,
                sink: Arc::clone(&sink),
            })
            .collect();
        GuardedCheckSet {
            checks,
        }
    }
}

/// A predicate bound to its name and diagnostic sink.
pub struct GuardedCheck {
    /// Unqualified check name.
    name: String,
    /// Wrapped predicate.
    predicate: Predicate,
    /// Destination for failure diagnostics.
    sink: Arc<dyn DiagnosticSink>,
}

impl GuardedCheck {
    /// Returns the unqualified check name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate, logging a diagnostic on failure.
    #[must_use]
    pub fn evaluate(&self, exchange: &Exchange, scope: &CheckScope) -> CheckOutcome {
        let verdict = match exchange {
            Ok(response) => (self.predicate)(response).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        let (passed, raised) = match verdict {
            Ok(passed) => (passed, None),
            Err(error) => (false, Some(error)),
        };
        let name = scope.qualify(&self.name);
        if passed {
            return CheckOutcome {
                name,
                passed,
                diagnostic: None,
            };
        }
        let detail = exchange
            .as_ref()
            .map_or_else(|_| NO_RESPONSE_DETAIL.to_string(), ApiResponse::describe);
        let diagnostic = CheckDiagnostic::new(name.clone(), detail, raised);
        self.sink.record(&DiagnosticRecord::new(
            scope.virtual_user,
            scope.iteration,
            diagnostic.clone(),
        ));
        CheckOutcome {
            name,
            passed,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Check set whose predicates log their own failures.
pub struct GuardedCheckSet {
    /// Guarded checks in insertion order.
    checks: Vec<GuardedCheck>,
}

impl GuardedCheckSet {
    /// Returns the guarded checks.
    #[must_use]
    pub fn checks(&self) -> &[GuardedCheck] {
        &self.checks
    }

    /// Evaluates every check against the exchange, in order.
    #[must_use]
    pub fn evaluate(&self, exchange: &Exchange, scope: &CheckScope) -> Vec<CheckOutcome> {
        self.checks.iter().map(|check| check.evaluate(exchange, scope)).collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
