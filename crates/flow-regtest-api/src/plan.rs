// crates/flow-regtest-api/src/plan.rs
// ============================================================================
// Module: Run Plan Assembly
// Description: Orders the Flow phases into a validated plan.
// Purpose: Build the phase sequence from configuration.
// Dependencies: flow-regtest-config, flow-regtest-core
// ============================================================================

//! ## Overview
//! The order is fixed: accounts first, then public data, uploads, GraphQL
//! reads, the calendar export, and finally deletion. The third-party login
//! phase is included only when application credentials are configured.
//! Contract validation runs here, before any request is sent.

use flow_regtest_config::FlowRegtestConfig;
use flow_regtest_core::Phase;
use flow_regtest_core::PlanError;
use flow_regtest_core::RunPlan;

use crate::env::ApiEnv;
use crate::phases::CalendarPhase;
use crate::phases::DeletePhase;
use crate::phases::DumpPhase;
use crate::phases::FacebookLoginPhase;
use crate::phases::LoginPhase;
use crate::phases::LookupPhase;
use crate::phases::RegisterPhase;
use crate::phases::SchedulePhase;
use crate::phases::TranscriptPhase;

/// Builds the validated phase plan for `config`.
///
/// # Errors
///
/// Returns [`PlanError`] when the phase contracts are inconsistent.
pub fn build_plan(config: &FlowRegtestConfig) -> Result<RunPlan<ApiEnv>, PlanError> {
    let mut phases: Vec<Box<dyn Phase<ApiEnv>>> =
        vec![Box::new(RegisterPhase), Box::new(LoginPhase)];
    if config.facebook.is_some() {
        phases.push(Box::new(FacebookLoginPhase));
    }
    phases.push(Box::new(DumpPhase));
    phases.push(Box::new(TranscriptPhase));
    phases.push(Box::new(SchedulePhase));
    phases.push(Box::new(LookupPhase));
    phases.push(Box::new(CalendarPhase::new(config.policy.calendar_secret_source)));
    phases.push(Box::new(DeletePhase));
    RunPlan::new(phases)
}
