// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Flow regression system-tests.
// Purpose: Provide the API stub, phase harness, and artifact utilities.
// Dependencies: system-tests, flow-regtest-api, flow-regtest-core
// ============================================================================

//! ## Overview
//! Shared helpers for Flow regression system-tests.
//! Invariants:
//! - Every suite talks to its own stub instance on a loopback port.
//! - Run artifacts land under `target/system-tests` unless overridden.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod flow_stub;
pub mod timeouts;
