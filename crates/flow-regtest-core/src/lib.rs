// crates/flow-regtest-core/src/lib.rs
// ============================================================================
// Module: Flow Regression Harness Core Library
// Description: Public API surface for the harness core.
// Purpose: Expose guarded checks, run context, phases, and the orchestrator.
// Dependencies: crate::{checker, checks, context, diagnostics, keys, ...}
// ============================================================================

//! ## Overview
//! The harness core is transport-agnostic. Phases written against it issue
//! requests however they like, hand the buffered [`ApiResponse`] (or the
//! [`TransportError`]) to a [`Checker`], and record their facts in the
//! [`RunContext`]. The [`RunPlan`] validates phase contracts up front and runs
//! phases in order without ever aborting on a failed check.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod checker;
pub mod checks;
pub mod context;
pub mod diagnostics;
pub mod keys;
pub mod orchestrator;
pub mod phase;
pub mod predicates;
pub mod report;
pub mod response;
pub mod virtual_user;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use checker::Checker;
pub use checks::CheckOutcome;
pub use checks::CheckScope;
pub use checks::CheckSet;
pub use checks::GuardedCheck;
pub use checks::GuardedCheckSet;
pub use checks::Predicate;
pub use context::CalendarSecretSource;
pub use context::ContextError;
pub use context::ContextField;
pub use context::EmailIdentity;
pub use context::PersonName;
pub use context::PhaseId;
pub use context::RunContext;
pub use context::SessionRefinement;
pub use context::ThirdPartyIdentity;
pub use context::UserRecord;
pub use diagnostics::CheckDiagnostic;
pub use diagnostics::DiagnosticMarker;
pub use diagnostics::DiagnosticRecord;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::FanoutDiagnosticSink;
pub use diagnostics::FileDiagnosticSink;
pub use diagnostics::MemoryDiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::StderrDiagnosticSink;
pub use keys::keys_are_exactly;
pub use orchestrator::PlanError;
pub use orchestrator::RunError;
pub use orchestrator::RunPlan;
pub use orchestrator::RunSettings;
pub use orchestrator::RunSinks;
pub use orchestrator::run_virtual_users;
pub use phase::Phase;
pub use phase::PhaseContract;
pub use report::CheckCount;
pub use report::CheckSink;
pub use report::CheckTally;
pub use report::RunSummary;
pub use response::ApiResponse;
pub use response::Exchange;
pub use response::PredicateError;
pub use response::TransportError;
pub use virtual_user::RunNonce;
pub use virtual_user::VirtualUser;
