// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: System Test Timeouts
// Description: Centralized timeout configuration with env overrides.
// Purpose: Keep system-test timeouts consistent and configurable across suites.
// ============================================================================

use std::time::Duration;

use system_tests::config::SystemTestEnv;
use system_tests::config::parse_timeout_seconds;
use system_tests::config::read_env_strict;

/// Returns the effective timeout, honoring `FLOW_SYSTEM_TEST_TIMEOUT_SEC` when set.
/// The override acts as a minimum to avoid shortening explicitly longer test timeouts.
#[must_use]
#[allow(clippy::panic, reason = "Invalid test configuration aborts the suite.")]
pub fn resolve_timeout(requested: Duration) -> Duration {
    let name = SystemTestEnv::TimeoutSeconds.as_str();
    match read_env_strict(name) {
        Ok(Some(raw)) => {
            let override_timeout = parse_timeout_seconds(name, &raw).unwrap_or_else(|err| {
                panic!("{err}");
            });
            std::cmp::max(requested, override_timeout)
        }
        Ok(None) => requested,
        Err(err) => panic!("{err}"),
    }
}
