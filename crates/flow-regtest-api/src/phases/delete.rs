// crates/flow-regtest-api/src/phases/delete.rs
// ============================================================================
// Module: GraphQL Delete Phase
// Description: Deletes the run's user row through the GraphQL engine.
// Purpose: Validate delete permissions, idempotency, and cleanup.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! Runs last so the account is gone before the next iteration. Deleting a
//! row the caller does not own affects nothing, deleting its own row affects
//! exactly one, and repeating that delete affects nothing. A final lookup
//! must come back empty.

use async_trait::async_trait;
use flow_regtest_core::CheckSet;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::predicates::array_len_is;
use flow_regtest_core::predicates::json_i64_eq;

use super::CONTEXT_AVAILABLE;
use crate::env::ApiEnv;
use crate::graphql::AFFECTED_ROWS;
use crate::graphql::DELETE_USER;
use crate::graphql::UNRELATED_USER_ID;
use crate::graphql::USER_BY_ID;
use crate::graphql::USER_ROWS;
use crate::graphql::id_variables;

/// Phase identifier.
pub const DELETE: PhaseId = PhaseId::new("user delete");

/// GraphQL delete phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePhase;

#[async_trait]
impl Phase<ApiEnv> for DeletePhase {
    fn id(&self) -> PhaseId {
        DELETE
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
        let Some(identity) = checker.require(CONTEXT_AVAILABLE, context.email().cloned()) else {
            return;
        };
        let token = identity.token.as_str();

        let attempts = [
            ("unauthorized", UNRELATED_USER_ID, 0),
            ("valid", identity.user_id, 1),
            ("nonexistent", identity.user_id, 0),
        ];
        for (group, id, affected) in attempts {
            let exchange = client.graphql(DELETE_USER, id_variables(id), token).await;
            let checks = CheckSet::new().check("count", json_i64_eq(AFFECTED_ROWS, affected));
            checker.group(group).check(&exchange, checks);
        }

        let gone = checker.group("lookup after delete");
        let exchange = client.graphql(USER_BY_ID, id_variables(identity.user_id), token).await;
        gone.check(&exchange, CheckSet::new().check("count", array_len_is(USER_ROWS, 0)));
    }
}
