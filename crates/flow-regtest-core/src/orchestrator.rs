// crates/flow-regtest-core/src/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Validated phase plans and the virtual-user runner.
// Purpose: Execute phases in order for each virtual user, never aborting.
// Dependencies: tokio, thiserror, crate::{checker, context, phase, report}
// ============================================================================

//! ## Overview
//! A [`RunPlan`] is an ordered list of phases whose contracts were validated
//! when the plan was built: every field a phase requires or refines must be
//! produced by an earlier phase, and no field has two producers. Invalid plans
//! fail before any request is issued.
//!
//! [`RunPlan::run_once`] executes one run with a fresh [`RunContext`].
//! [`run_virtual_users`] spawns one tokio task per virtual user; each task runs
//! its iterations sequentially. Tasks share only the immutable environment and
//! the thread-safe sinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::checker::Checker;
use crate::context::ContextField;
use crate::context::PhaseId;
use crate::context::RunContext;
use crate::diagnostics::DiagnosticSink;
use crate::phase::Phase;
use crate::report::CheckSink;
use crate::virtual_user::RunNonce;
use crate::virtual_user::VirtualUser;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Plan validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plan has no phases.
    #[error("run plan has no phases")]
    Empty,
    /// Two phases share an identifier.
    #[error("phase `{0}` appears more than once")]
    DuplicatePhase(PhaseId),
    /// A phase needs a field no earlier phase produces.
    #[error("phase `{phase}` requires `{field}` but no earlier phase produces it")]
    UnmetRequirement {
        /// Phase with the unmet requirement.
        phase: PhaseId,
        /// Missing field.
        field: ContextField,
    },
    /// Two phases produce the same field.
    #[error("`{field}` is produced by both `{first}` and `{second}`")]
    DuplicateProducer {
        /// Field produced twice.
        field: ContextField,
        /// Earlier producer.
        first: PhaseId,
        /// Later producer.
        second: PhaseId,
    },
}

/// Virtual-user runner failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Settings requested no work.
    #[error("virtual_users and iterations must be greater than zero")]
    NoWork,
    /// A virtual-user task panicked or was cancelled.
    #[error("virtual user task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Validated, ordered list of phases.
pub struct RunPlan<E: Sync> {
    /// Phases in execution order.
    phases: Vec<Box<dyn Phase<E>>>,
}

impl<E: Sync> RunPlan<E> {
    /// Validates phase contracts and builds the plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the plan is empty, repeats a phase, or
    /// violates a context contract.
    pub fn new(phases: Vec<Box<dyn Phase<E>>>) -> Result<Self, PlanError> {
        if phases.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut seen = BTreeSet::new();
        let mut producers: BTreeMap<ContextField, PhaseId> = BTreeMap::new();
        for phase in &phases {
            let id = phase.id();
            if !seen.insert(id) {
                return Err(PlanError::DuplicatePhase(id));
            }
            let contract = phase.contract();
            for field in contract.requires.iter().chain(contract.refines) {
                if !producers.contains_key(field) {
                    return Err(PlanError::UnmetRequirement {
                        phase: id,
                        field: *field,
                    });
                }
            }
            for field in contract.produces {
                if let Some(first) = producers.get(field) {
                    return Err(PlanError::DuplicateProducer {
                        field: *field,
                        first: *first,
                        second: id,
                    });
                }
                producers.insert(*field, id);
            }
        }
        Ok(Self {
            phases,
        })
    }

    /// Returns phase identifiers in execution order.
    #[must_use]
    pub fn phase_ids(&self) -> Vec<PhaseId> {
        self.phases.iter().map(|phase| phase.id()).collect()
    }

    /// Runs every phase once, in order, with a fresh context.
    ///
    /// Each phase runs inside a check group named after its identifier.
    pub async fn run_once(
        &self,
        env: &E,
        virtual_user: VirtualUser,
        checker: &Checker,
    ) -> RunContext {
        let mut context = RunContext::new(virtual_user);
        for phase in &self.phases {
            let id = phase.id();
            context.enter_phase(id, phase.contract());
            phase.run(env, &mut context, &checker.group(id.as_str())).await;
            context.leave_phase();
        }
        context
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Shape of a concurrent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Number of concurrent virtual users.
    pub virtual_users: u32,
    /// Sequential iterations per virtual user.
    pub iterations: u32,
}

/// Sinks shared by every virtual user.
#[derive(Clone)]
pub struct RunSinks {
    /// Outcome sink.
    pub checks: Arc<dyn CheckSink>,
    /// Diagnostic sink.
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

/// Runs `settings.virtual_users` concurrent tasks, each executing the plan
/// `settings.iterations` times. Returns the number of completed runs.
///
/// # Errors
///
/// Returns [`RunError`] when settings request no work or a task fails.
pub async fn run_virtual_users<E>(
    plan: Arc<RunPlan<E>>,
    env: Arc<E>,
    settings: RunSettings,
    sinks: RunSinks,
    nonce: RunNonce,
) -> Result<u64, RunError>
where
    E: Send + Sync + 'static,
{
    if settings.virtual_users == 0 || settings.iterations == 0 {
        return Err(RunError::NoWork);
    }
    let mut tasks = JoinSet::new();
    for number in 1..=settings.virtual_users {
        let plan = Arc::clone(&plan);
        let env = Arc::clone(&env);
        let sinks = sinks.clone();
        let nonce = nonce.clone();
        tasks.spawn(async move {
            let mut completed = 0_u64;
            for iteration in 0..settings.iterations {
                let checker = Checker::new(
                    Arc::clone(&sinks.checks),
                    Arc::clone(&sinks.diagnostics),
                    Some(number),
                    Some(iteration),
                );
                let user = VirtualUser::new(number, iteration, nonce.clone());
                plan.run_once(env.as_ref(), user, &checker).await;
                completed += 1;
            }
            completed
        });
    }
    let mut total = 0_u64;
    while let Some(joined) = tasks.join_next().await {
        total += joined.map_err(|err| RunError::TaskFailed(err.to_string()))?;
    }
    Ok(total)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
