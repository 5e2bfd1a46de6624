// system-tests/src/lib.rs
// ============================================================================
// Module: Flow Regression System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the system-test binaries in
//! `system-tests/tests`. The binaries drive the harness phases against an
//! in-process stub of the Flow API, so no deployment is needed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
