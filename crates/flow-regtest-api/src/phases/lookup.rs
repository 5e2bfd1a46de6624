// crates/flow-regtest-api/src/phases/lookup.rs
// ============================================================================
// Module: GraphQL Lookup Phase
// Description: Reads user rows through the GraphQL engine.
// Purpose: Validate row-level permissions and registration persistence.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! Queries run with the email identity's bearer token. A row the caller does
//! not own must be invisible; the caller's own row must come back once with
//! the registered name; a lookup by email must also find exactly one row,
//! which shows the duplicate registration did not insert a second account.

use async_trait::async_trait;
use flow_regtest_core::CheckSet;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::UserRecord;
use flow_regtest_core::predicates::array_len_is;
use flow_regtest_core::predicates::json_str_eq;

use super::CONTEXT_AVAILABLE;
use super::CONTEXT_RECORDED;
use super::ENVELOPE_DECODED;
use crate::env::ApiEnv;
use crate::envelope::UserRow;
use crate::envelope::decode;
use crate::graphql::FIRST_USER_ROW;
use crate::graphql::UNRELATED_USER_ID;
use crate::graphql::USER_BY_EMAIL;
use crate::graphql::USER_BY_ID;
use crate::graphql::USER_ROWS;
use crate::graphql::email_variables;
use crate::graphql::id_variables;

/// Phase identifier.
pub const LOOKUP: PhaseId = PhaseId::new("user lookup");

/// GraphQL lookup phase; produces the looked-up user record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupPhase;

#[async_trait]
impl Phase<ApiEnv> for LookupPhase {
    fn id(&self) -> PhaseId {
        LOOKUP
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract {
            requires: &[ContextField::EmailIdentity],
            produces: &[ContextField::LookedUpUser],
            refines: &[],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;
        let Some(identity) = checker.require(CONTEXT_AVAILABLE, context.email().cloned()) else {
            return;
        };
        let token = identity.token.as_str();

        let unrelated = checker.group("unrelated user");
        let exchange = client.graphql(USER_BY_ID, id_variables(UNRELATED_USER_ID), token).await;
        unrelated.check(&exchange, CheckSet::new().check("count", array_len_is(USER_ROWS, 0)));

        let own = checker.group("own user");
        let exchange = client.graphql(USER_BY_ID, id_variables(identity.user_id), token).await;
        let checks = CheckSet::new()
            .check("count", array_len_is(USER_ROWS, 1))
            .check("name matches", json_str_eq("data.user.0.full_name", identity.name.full()));
        if own.check(&exchange, checks)
            && let Some(row) =
                own.require(ENVELOPE_DECODED, decode::<UserRow>(&exchange, FIRST_USER_ROW))
        {
            let record = UserRecord {
                id: row.id,
                full_name: row.full_name,
                secret_id: row.secret_id,
            };
            own.require(CONTEXT_RECORDED, context.record_looked_up_user(record));
        }

        let by_email = checker.group("by email");
        let exchange =
            client.graphql(USER_BY_EMAIL, email_variables(&identity.email), token).await;
        by_email.check(&exchange, CheckSet::new().check("count", array_len_is(USER_ROWS, 1)));
    }
}
