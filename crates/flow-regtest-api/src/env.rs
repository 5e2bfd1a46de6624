// crates/flow-regtest-api/src/env.rs
// ============================================================================
// Module: API Run Environment
// Description: Immutable state shared by every virtual user.
// Purpose: Bundle the client, fixtures, and asserted policy for the phases.
// Dependencies: thiserror, flow-regtest-config
// ============================================================================

//! ## Overview
//! [`ApiEnv`] is built once per process and shared behind an `Arc`. Nothing
//! in it changes during a run; per-run state lives in
//! [`flow_regtest_core::RunContext`].

use flow_regtest_config::DumpConfig;
use flow_regtest_config::FlowRegtestConfig;
use flow_regtest_config::PolicyConfig;
use flow_regtest_core::TransportError;
use thiserror::Error;

use crate::client::FlowClient;
use crate::fixtures::FixtureError;
use crate::fixtures::Fixtures;
use crate::provision::TestUserProvisioner;

/// Environment construction failures.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Transport(#[from] TransportError),
    /// A fixture could not be loaded.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Shared, read-only inputs for every phase.
#[derive(Debug, Clone)]
pub struct ApiEnv {
    /// HTTP client.
    pub client: FlowClient,
    /// Loaded fixtures.
    pub fixtures: Fixtures,
    /// Asserted server behavior.
    pub policy: PolicyConfig,
    /// Data dump thresholds.
    pub dump: DumpConfig,
    /// Third-party test-user source, when credentials are configured.
    pub provisioner: Option<TestUserProvisioner>,
}

impl ApiEnv {
    /// Builds the environment from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError`] when the client cannot be built or a fixture fails
    /// to load.
    pub fn from_config(config: &FlowRegtestConfig) -> Result<Self, EnvError> {
        Ok(Self {
            client: FlowClient::from_config(&config.api)?,
            fixtures: Fixtures::load(&config.fixtures)?,
            policy: config.policy.clone(),
            dump: config.dump,
            provisioner: config.facebook.as_ref().map(TestUserProvisioner::from_config),
        })
    }
}
