// crates/flow-regtest-api/src/phases/facebook.rs
// ============================================================================
// Module: Facebook Login Phase
// Description: Exercises `POST /auth/facebook/login`.
// Purpose: Validate third-party login and its idempotency.
// Dependencies: async-trait, serde_json, flow-regtest-core
// ============================================================================

//! ## Overview
//! A provider test-user token is fetched for the virtual user, then used to
//! log in twice. Both logins must succeed and the second must resolve to the
//! same account and calendar secret as the first. The comparison reads the
//! first response directly; the run context only receives the identity once
//! every envelope check passed.

use async_trait::async_trait;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::ThirdPartyIdentity;
use flow_regtest_core::predicates::json_i64_eq;
use flow_regtest_core::predicates::json_str_eq;
use serde_json::json;

use super::CONTEXT_RECORDED;
use super::ENVELOPE_DECODED;
use super::envelope_checks;
use super::error_checks;
use super::status_checks;
use crate::codes::FACEBOOK_AUTH_BAD_REQUEST;
use crate::env::ApiEnv;
use crate::envelope::AuthEnvelope;
use crate::envelope::decode;
use crate::provision::ProvisionError;

/// Third-party login endpoint.
pub const ENDPOINT: &str = "/auth/facebook/login";

/// Phase identifier.
pub const FACEBOOK_LOGIN: PhaseId = PhaseId::new("facebook login");

/// Check recording whether the first login yielded ids to compare against.
const FIRST_LOGIN_DECODED: &str = "first login decoded";

/// Third-party login phase; produces the third-party identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacebookLoginPhase;

#[async_trait]
impl Phase<ApiEnv> for FacebookLoginPhase {
    fn id(&self) -> PhaseId {
        FACEBOOK_LOGIN
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract {
            requires: &[],
            produces: &[ContextField::ThirdPartyIdentity],
            refines: &[],
        }
    }

    async fn run(&self, env: &ApiEnv, context: &mut RunContext, checker: &Checker) {
        let client = &env.client;

        let missing = checker.group("missing token");
        let exchange = client.post_json(ENDPOINT, &json!({}), None).await;
        missing.check(&exchange, error_checks(400, FACEBOOK_AUTH_BAD_REQUEST));

        let index = usize::try_from(context.virtual_user().number).unwrap_or(usize::MAX);
        let provisioned = match env.provisioner.as_ref() {
            Some(provisioner) => provisioner.access_token(client, index).await,
            None => Err(ProvisionError::NotConfigured),
        };
        let Some(access_token) = checker.require("test user provisioned", provisioned) else {
            return;
        };
        let body = json!({ "access_token": access_token });

        let first = checker.group("valid token");
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        let first_login = decode::<AuthEnvelope>(&exchange, "");
        if first.check(&exchange, envelope_checks())
            && let Some(envelope) = first.require(ENVELOPE_DECODED, first_login.as_ref())
        {
            let identity = ThirdPartyIdentity {
                token: envelope.token.clone(),
                user_id: envelope.user_id,
                secret_id: envelope.secret_id.clone(),
            };
            first.require(CONTEXT_RECORDED, context.record_third_party(identity));
        }

        // Ids come from the first response, not the context.
        let repeated = checker.group("repeated login");
        let exchange = client.post_json(ENDPOINT, &body, None).await;
        let mut checks = status_checks(200);
        if let Some(envelope) = repeated.require(FIRST_LOGIN_DECODED, first_login) {
            checks = checks
                .check("same user_id", json_i64_eq("user_id", envelope.user_id))
                .check("same secret_id", json_str_eq("secret_id", envelope.secret_id));
        }
        repeated.check(&exchange, checks);
    }
}
