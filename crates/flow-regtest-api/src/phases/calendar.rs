// crates/flow-regtest-api/src/phases/calendar.rs
// ============================================================================
// Module: Calendar Export Phase
// Description: Exercises the unauthenticated iCalendar export.
// Purpose: Validate secret-addressed calendar access and its contents.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! The export is addressed only by the opaque secret id, never by user id.
//! The secret is read from the auth envelope or from the GraphQL lookup
//! record depending on [`CalendarSecretSource`]; the rest of the phase is the
//! same either way. Bodies are compared after `DTSTAMP` lines are dropped.

use async_trait::async_trait;
use flow_regtest_core::ApiResponse;
use flow_regtest_core::CalendarSecretSource;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::predicates::header_is;

use super::CONTEXT_AVAILABLE;
use super::status_checks;
use crate::env::ApiEnv;
use crate::fixtures::normalize_calendar;

/// Phase identifier.
pub const CALENDAR: PhaseId = PhaseId::new("calendar");

/// Media type of the export.
pub const CALENDAR_MEDIA_TYPE: &str = "text/calendar";

/// Secret id that addresses no calendar.
const UNKNOWN_SECRET: &str = "notanid";

/// Requirements when the secret comes from the auth envelope.
const ENVELOPE_REQUIRES: &[ContextField] = &[ContextField::EmailIdentity];

/// Requirements when the secret comes from the lookup record.
const LOOKUP_REQUIRES: &[ContextField] = &[ContextField::LookedUpUser];

/// Calendar export phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarPhase {
    /// Where the secret id is read from.
    pub source: CalendarSecretSource,
}

impl CalendarPhase {
    /// Creates the phase for a secret source.
    #[must_use]
    pub const fn new(source: CalendarSecretSource) -> Self {
        Self {
            source,
        }
    }
}

#[async_trait]
impl Phase<ApiEnv> for CalendarPhase {
    fn id(&self) -> PhaseId {
        CALENDAR
    }

    fn contract(&self) -> PhaseContract {
        let requires = match self.source {
            CalendarSecretSource::Envelope => ENVELOPE_REQUIRES,
            CalendarSecretSource::Lookup => LOOKUP_REQUIRES,
        };
        PhaseContract {
            requires,
            produces: &[],
            refines: &[],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;
        let policy = &env.policy;

        let secret = context.calendar_secret(self.source).map(str::to_string);
        if let Some(secret) = checker.require(CONTEXT_AVAILABLE, secret) {
            let valid = checker.group("valid");
            let path = calendar_path(&policy.calendar_path_prefix, &secret);
            let exchange = client.get(&path).await;
            let mut checks = status_checks(policy.calendar_success_status)
                .check("MIME type", header_is("content-type", CALENDAR_MEDIA_TYPE));
            if let Some(expected) = env.fixtures.calendar.clone() {
                checks = checks.check("correct body", move |response: &ApiResponse| {
                    Ok(normalize_calendar(response.text()?) == expected)
                });
            }
            valid.check(&exchange, checks);
        }

        let invalid = checker.group("invalid");
        let path = calendar_path(&policy.calendar_path_prefix, UNKNOWN_SECRET);
        let exchange = client.get(&path).await;
        invalid.check(&exchange, status_checks(policy.calendar_invalid_status));
    }
}

/// Returns `{prefix}/{secret}.ics`.
#[must_use]
pub fn calendar_path(prefix: &str, secret: &str) -> String {
    format!("{}/{secret}.ics", prefix.trim_end_matches('/'))
}
