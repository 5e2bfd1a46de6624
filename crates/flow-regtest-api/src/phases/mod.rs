// crates/flow-regtest-api/src/phases/mod.rs
// ============================================================================
// Module: Flow Phases
// Description: One phase per API surface exercised by a run.
// Purpose: Group the phase implementations and their shared check sets.
// Dependencies: flow-regtest-core
// ============================================================================

//! ## Overview
//! Each phase follows the same shape: negative inputs first, then the valid
//! path, then a repetition that must produce a specific divergent or
//! identical outcome, and finally the context write. Context is written only
//! after the valid-path checks pass; a later phase that needs the value sees
//! a `context available` failure instead of a fabricated value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flow_regtest_core::CheckSet;
use flow_regtest_core::predicates::error_code_in;
use flow_regtest_core::predicates::keys_exactly;
use flow_regtest_core::predicates::status_is;

use crate::envelope::AUTH_ENVELOPE_KEYS;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod calendar;
pub mod delete;
pub mod dump;
pub mod facebook;
pub mod login;
pub mod lookup;
pub mod register;
pub mod schedule;
pub mod transcript;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use calendar::CalendarPhase;
pub use delete::DeletePhase;
pub use dump::DumpPhase;
pub use facebook::FacebookLoginPhase;
pub use login::LoginPhase;
pub use lookup::LookupPhase;
pub use register::RegisterPhase;
pub use schedule::SchedulePhase;
pub use transcript::TranscriptPhase;

// ============================================================================
// SECTION: Shared Checks
// ============================================================================

/// Check name recorded when a required context field is missing.
pub const CONTEXT_AVAILABLE: &str = "context available";

/// Check name recorded when a checked body cannot be decoded.
pub const ENVELOPE_DECODED: &str = "envelope decoded";

/// Check name recorded when a context write is rejected.
pub const CONTEXT_RECORDED: &str = "context recorded";

/// Status plus error-code family.
pub(crate) fn error_checks(status: u16, codes: &'static [&'static str]) -> CheckSet {
    CheckSet::new()
        .check("status", status_is(status))
        .check("error message", error_code_in(codes))
}

/// Status 200 plus the exact auth envelope keys.
pub(crate) fn envelope_checks() -> CheckSet {
    CheckSet::new()
        .check("status", status_is(200))
        .check("keys", keys_exactly("", AUTH_ENVELOPE_KEYS))
}

/// Status only.
pub(crate) fn status_checks(status: u16) -> CheckSet {
    CheckSet::new().check("status", status_is(status))
}
