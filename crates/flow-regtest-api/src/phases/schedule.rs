// crates/flow-regtest-api/src/phases/schedule.rs
// ============================================================================
// Module: Schedule Upload Phase
// Description: Exercises `POST /parse/schedule`.
// Purpose: Validate authenticated schedule import and idempotent re-import.
// Dependencies: async-trait, serde_json, flow-regtest-core
// ============================================================================

//! ## Overview
//! Posts the schedule fixture as `{"text": ...}`. Importing the same schedule
//! twice must succeed both times with the same section count; the second
//! import replaces rather than duplicates.

use async_trait::async_trait;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::predicates::json_i64_eq;
use serde_json::Value;
use serde_json::json;

use super::CONTEXT_AVAILABLE;
use super::status_checks;
use crate::env::ApiEnv;

/// Schedule endpoint.
pub const ENDPOINT: &str = "/parse/schedule";

/// Phase identifier.
pub const SCHEDULE: PhaseId = PhaseId::new("schedule");

/// Schedule upload phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulePhase;

#[async_trait]
impl Phase<ApiEnv> for SchedulePhase {
    fn id(&self) -> PhaseId {
        SCHEDULE
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract {
            requires: &[ContextField::EmailIdentity],
            produces: &[],
            refines: &[],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;
        let body = schedule_body(&env.fixtures.schedule_text);
        let expected = i64::try_from(env.fixtures.schedule_sections).unwrap_or(i64::MAX);

        let unauthorized = checker.group("unauthorized");
        let exchange = client.post_json(ENDPOINT, &body, Some("")).await;
        unauthorized.check(&exchange, status_checks(401));

        let token = context.email().map(|identity| identity.token.clone());
        let Some(token) = checker.require(CONTEXT_AVAILABLE, token) else {
            return;
        };

        for group in ["valid", "valid again"] {
            let exchange = client.post_json(ENDPOINT, &body, Some(&token)).await;
            let checks = status_checks(200)
                .check("all sections imported", json_i64_eq("sections_imported", expected));
            checker.group(group).check(&exchange, checks);
        }

        let malformed = checker.group("malformed");
        let exchange = client.post_json(ENDPOINT, &schedule_body(""), Some(&token)).await;
        malformed.check(&exchange, status_checks(400));
    }
}

/// Request body for a schedule upload.
fn schedule_body(text: &str) -> Value {
    json!({ "text": text })
}
