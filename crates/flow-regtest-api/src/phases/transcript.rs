// crates/flow-regtest-api/src/phases/transcript.rs
// ============================================================================
// Module: Transcript Upload Phase
// Description: Exercises `POST /parse/transcript`.
// Purpose: Validate authenticated multipart import of a transcript PDF.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! Uploads the transcript fixture as multipart field `file`. An upload with
//! an empty bearer must be refused, the fixture must import exactly the
//! configured number of courses, and bytes that are not a transcript must be
//! rejected.

use async_trait::async_trait;
use flow_regtest_core::Checker;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::predicates::json_i64_eq;

use super::CONTEXT_AVAILABLE;
use super::status_checks;
use crate::env::ApiEnv;

/// Transcript endpoint.
pub const ENDPOINT: &str = "/parse/transcript";

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Phase identifier.
pub const TRANSCRIPT: PhaseId = PhaseId::new("transcript");

/// Bytes that no transcript parser accepts.
const NOT_A_TRANSCRIPT: &[u8] = b"not a transcript";

/// Transcript upload phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptPhase;

#[async_trait]
impl Phase<ApiEnv> for TranscriptPhase {
    fn id(&self) -> PhaseId {
        TRANSCRIPT
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
        let fixtures = &env.fixtures;
        let name = fixtures.transcript_name.as_str();

        let unauthorized = checker.group("unauthorized");
        let exchange = client
            .post_file(ENDPOINT, FILE_FIELD, name, fixtures.transcript.clone(), Some(""))
            .await;
        unauthorized.check(&exchange, status_checks(401));

        let token = context.email().map(|identity| identity.token.clone());
        let Some(token) = checker.require(CONTEXT_AVAILABLE, token) else {
            return;
        };

        let valid = checker.group("valid");
        let exchange = client
            .post_file(ENDPOINT, FILE_FIELD, name, fixtures.transcript.clone(), Some(&token))
            .await;
        let expected = i64::try_from(fixtures.transcript_courses).unwrap_or(i64::MAX);
        let checks = status_checks(200)
            .check("all courses imported", json_i64_eq("courses_imported", expected));
        valid.check(&exchange, checks);

        let malformed = checker.group("malformed");
        let exchange = client
            .post_file(ENDPOINT, FILE_FIELD, name, NOT_A_TRANSCRIPT.to_vec(), Some(&token))
            .await;
        malformed.check(&exchange, status_checks(400));
    }
}
