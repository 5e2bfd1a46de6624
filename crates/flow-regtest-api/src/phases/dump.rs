// crates/flow-regtest-api/src/phases/dump.rs
// ============================================================================
// Module: Data Dump Phase
// Description: Exercises `GET /data/search`.
// Purpose: Validate the public course and professor dump.
// Dependencies: async-trait, flow-regtest-core
// ============================================================================

//! ## Overview
//! The dump is public and independent of the run's accounts. Counts are
//! lower bounds from configuration since the catalogue only grows.

use async_trait::async_trait;
use flow_regtest_core::CheckSet;
use flow_regtest_core::Checker;
use flow_regtest_core::Phase;
use flow_regtest_core::PhaseContract;
use flow_regtest_core::PhaseId;
use flow_regtest_core::RunContext;
use flow_regtest_core::predicates::array_len_greater_than;
use flow_regtest_core::predicates::keys_exactly;
use flow_regtest_core::predicates::status_is;

use crate::env::ApiEnv;

/// Dump endpoint.
pub const ENDPOINT: &str = "/data/search";

/// Phase identifier.
pub const DUMP: PhaseId = PhaseId::new("dump");

/// Top-level keys of the dump.
pub const DUMP_KEYS: &[&str] = &["courses", "profs"];

/// Keys of one course entry.
pub const COURSE_KEYS: &[&str] = &["id", "code", "name", "profs", "rating_count"];

/// Keys of one professor entry.
pub const PROF_KEYS: &[&str] = &["id", "code", "name", "courses", "rating_count"];

/// Data dump phase; touches no context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpPhase;

#[async_trait]
impl Phase<ApiEnv> for DumpPhase {
    fn id(&self) -> PhaseId {
        DUMP
    }

    fn contract(&self) -> PhaseContract {
        PhaseContract::NONE
    }

    async fn run(&self, env: &ApiEnv, _context: &mut RunContext, checker: &Checker) {
        let exchange = env.client.get(ENDPOINT).await;
        let min_courses = usize::try_from(env.dump.min_courses).unwrap_or(usize::MAX);
        let min_profs = usize::try_from(env.dump.min_profs).unwrap_or(usize::MAX);
        let checks = CheckSet::new()
            .check("status", status_is(200))
            .check("keys", keys_exactly("", DUMP_KEYS))
            .check("course count", array_len_greater_than("courses", min_courses))
            .check("course keys", keys_exactly("courses.0", COURSE_KEYS))
            .check("prof count", array_len_greater_than("profs", min_profs))
            .check("prof keys", keys_exactly("profs.0", PROF_KEYS));
        checker.check(&exchange, checks);
    }
}
