// crates/flow-regtest-config/src/lib.rs
// ============================================================================
// Module: Flow Regression Harness Config Library
// Description: Public API surface for harness configuration.
// Purpose: Expose the config model, loader, and environment overrides.
// Dependencies: crate::{config, env}
// ============================================================================

//! ## Overview
//! The harness reads one TOML file (`flow-regtest.toml` by default) and lets a
//! small set of environment variables override endpoints, credentials, the
//! timeout, and the artifact root. Everything is validated before a run
//! starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use config::ApiConfig;
pub use config::ConfigError;
pub use config::DumpConfig;
pub use config::FacebookConfig;
pub use config::FixturesConfig;
pub use config::FlowRegtestConfig;
pub use config::PolicyConfig;
pub use config::RunConfig;
pub use env::EnvOverrides;
pub use env::FacebookCredentials;
pub use env::RegtestEnv;
pub use env::read_env_strict;
