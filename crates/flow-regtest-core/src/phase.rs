// crates/flow-regtest-core/src/phase.rs
// ============================================================================
// Module: Phase Interface
// Description: Phase trait and the context contract each phase declares.
// Purpose: Let independently authored phases compose into one run.
// Dependencies: async-trait, crate::{checker, context}
// ============================================================================

//! ## Overview
//! A phase is one stage of the end-to-end run. It issues requests against the
//! environment `E`, evaluates checks through the [`Checker`], and writes its
//! facts into the [`RunContext`]. A phase never aborts the run: failures are
//! recorded as check outcomes and the next phase runs regardless.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;

use crate::checker::Checker;
use crate::context::ContextField;
use crate::context::PhaseId;
use crate::context::RunContext;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Context fields a phase reads, writes, and refines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseContract {
    /// Fields that must be produced by an earlier phase.
    pub requires: &'static [ContextField],
    /// Fields this phase writes once.
    pub produces: &'static [ContextField],
    /// Fields produced earlier that this phase may refine in place.
    pub refines: &'static [ContextField],
}

impl PhaseContract {
    /// Contract for a phase that touches no context.
    pub const NONE: Self = Self {
        requires: &[],
        produces: &[],
        refines: &[],
    };
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// One stage of an end-to-end run against environment `E`.
#[async_trait]
pub trait Phase<E: Sync>: Send + Sync {
    /// Stable phase identifier, also used as the outer check group.
    fn id(&self) -> PhaseId;

    /// Context fields the phase reads and writes.
    fn contract(&self) -> PhaseContract;

    /// Runs the phase. Failures surface as check outcomes only.
    async fn run(&self, env: &E, context: &mut RunContext, checker: &Checker);
}
