// crates/flow-regtest-api/src/lib.rs
// ============================================================================
// Module: Flow API Phases Library
// Description: Client, fixtures, and phases for the Flow web API.
// Purpose: Bind the transport-agnostic harness core to the Flow endpoints.
// Dependencies: crate::{client, codes, env, envelope, fixtures, ...}
// ============================================================================

//! ## Overview
//! [`ApiEnv`] carries everything a run shares: the HTTP client, fixtures,
//! asserted policy, and the optional test-user provisioner. [`build_plan`]
//! orders the phases in [`phases`] into a validated
//! [`flow_regtest_core::RunPlan`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod codes;
pub mod env;
pub mod envelope;
pub mod fixtures;
pub mod graphql;
pub mod identity;
pub mod phases;
pub mod plan;
pub mod provision;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::FlowClient;
pub use codes::ApiErrorCode;
pub use env::ApiEnv;
pub use env::EnvError;
pub use envelope::AuthEnvelope;
pub use envelope::DecodeError;
pub use fixtures::FixtureError;
pub use fixtures::Fixtures;
pub use fixtures::normalize_calendar;
pub use identity::TestUser;
pub use plan::build_plan;
pub use provision::ProvisionError;
pub use provision::TestUserProvisioner;
