// crates/flow-regtest-api/src/phases/login.rs
// ============================================================================
// Module: Email Login Phase
// Description: Exercises `POST /auth/email/login`.
// Purpose: Validate credential errors and session issuance for the new user.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! Logs in as the account registered earlier in the run. The returned
//! `user_id` must match registration; the new token and secret id refine the
//! email identity in place.

use async_trait::async_trait;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::SessionRefinement;
use flow_regtest_core::predicates::json_i64_eq;

use super::CONTEXT_AVAILABLE;
use super::CONTEXT_RECORDED;
use super::ENVELOPE_DECODED;
use super::envelope_checks;
use super::error_checks;
use crate::codes::EMAIL_NOT_REGISTERED;
use crate::codes::EMAIL_WRONG_PASSWORD;
use crate::env::ApiEnv;
use crate::envelope::AuthEnvelope;
use crate::envelope::decode;
use crate::identity::UNREGISTERED_EMAIL;
use crate::identity::WRONG_PASSWORD;
use crate::identity::login_body;

/// Login endpoint.
pub const ENDPOINT: &str = "/auth/email/login";

/// Phase identifier.
pub const LOGIN: PhaseId = PhaseId::new("email login");

/// Email login phase; refines the email session.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPhase;

#[async_trait]
impl Phase<ApiEnv> for LoginPhase {
    fn id(&self) -> PhaseId {
        LOGIN
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract {
            requires: &[ContextField::EmailIdentity],
            produces: &[],
            refines: &[ContextField::EmailIdentity],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;

        let unknown = checker.group("nonexistent email");
        let exchange =
            client.post_json(ENDPOINT, &login_body(UNREGISTERED_EMAIL, WRONG_PASSWORD), None).await;
        unknown.check(&exchange, error_checks(401, EMAIL_NOT_REGISTERED));

        let Some(identity) = checker.require(CONTEXT_AVAILABLE, context.email().cloned()) else {
            return;
        };

        let wrong = checker.group("incorrect password");
        let exchange =
            client.post_json(ENDPOINT, &login_body(&identity.email, WRONG_PASSWORD), None).await;
        wrong.check(&exchange, error_checks(401, EMAIL_WRONG_PASSWORD));

        let correct = checker.group("correct credentials");
        let body = login_body(&identity.email, &identity.password);
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        let checks = envelope_checks()
            .check("user_id matches registration", json_i64_eq("user_id", identity.user_id));
        if correct.check(&exchange, checks)
            && let Some(envelope) =
                correct.require(ENVELOPE_DECODED, decode::<AuthEnvelope>(&exchange, ""))
        {
            let refinement = SessionRefinement {
                token: envelope.token,
                secret_id: envelope.secret_id,
            };
            correct.require(CONTEXT_RECORDED, context.refine_email_session(refinement));
        }
    }
}
