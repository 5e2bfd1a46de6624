// crates/flow-regtest-api/src/phases/register.rs
// ============================================================================
// Module: Email Registration Phase
// Description: Exercises `POST /auth/email/register`.
// Purpose: Validate input rejection, account creation, and duplicate refusal.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! Empty and short inputs must be rejected with their specific codes. A valid
//! run-unique account is then created and recorded as the email identity.
//! Submitting the identical input again must fail with an email-taken code;
//! that divergence is what proves duplicate detection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;

use super::CONTEXT_RECORDED;
use super::ENVELOPE_DECODED;
use super::envelope_checks;
use super::error_checks;
use crate::codes::BAD_REQUEST_FAMILY;
use crate::codes::EMAIL_TAKEN_FAMILY;
use crate::codes::EMAIL_TOO_SHORT;
use crate::codes::PASSWORD_TOO_SHORT;
use crate::env::ApiEnv;
use crate::envelope::AuthEnvelope;
use crate::envelope::decode;
use crate::identity::SHORT_EMAIL;
use crate::identity::SHORT_PASSWORD;
use crate::identity::TestUser;
use crate::identity::registration_body;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registration endpoint.
pub const ENDPOINT: &str = "/auth/email/register";

/// Phase identifier.
pub const REGISTER: PhaseId = PhaseId::new("email register");

/// `(email, name, password)` triples with at least one empty field.
const EMPTY_FIELD_INPUTS: [(&str, &str, &str); 4] =
    [("", "", ""), ("email", "", ""), ("", "name", ""), ("email", "name", "")];

/// Valid email used with the short password.
const VALID_EMAIL: &str = "test@test.test";

/// Valid name used with short fields.
const VALID_NAME: &str = "First Last";

/// Valid password used with the short email.
const VALID_PASSWORD: &str = "password";

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Email registration phase; produces the email identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterPhase;

#[async_trait]
impl Phase<ApiEnv> for RegisterPhase {
    fn id(&self) -> PhaseId {
        REGISTER
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract {
            requires: &[],
            produces: &[ContextField::EmailIdentity],
            refines: &[],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;

        let empty = checker.group("empty fields");
        for (email, name, password) in EMPTY_FIELD_INPUTS {
            let body = registration_body(email, name, password);
            let exchange = client.post_json(ENDPOINT, &body, None).await;
            empty.check(&exchange, error_checks(400, BAD_REQUEST_FAMILY));
        }

        let short = checker.group("short fields");
        let body = registration_body(VALID_EMAIL, VALID_NAME, SHORT_PASSWORD);
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        short.check(&exchange, error_checks(400, PASSWORD_TOO_SHORT));
        let body = registration_body(SHORT_EMAIL, VALID_NAME, VALID_PASSWORD);
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        short.check(&exchange, error_checks(400, EMAIL_TOO_SHORT));

        let user = TestUser::for_run(context.virtual_user());
        let body = user.registration_body();

        let valid = checker.group("valid registration");
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        if valid.check(&exchange, envelope_checks())
            && let Some(envelope) =
                valid.require(ENVELOPE_DECODED, decode::<AuthEnvelope>(&exchange, ""))
        {
            valid.require(CONTEXT_RECORDED, context.record_email(user.into_identity(envelope)));
        }

        let duplicate = checker.group("duplicate registration");
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        duplicate.check(
            &exchange,
            error_checks(env.policy.duplicate_registration_status, EMAIL_TAKEN_FAMILY),
        );
    }
}
