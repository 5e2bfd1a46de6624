// system-tests/tests/suites/cleanup.rs
// ============================================================================
// Module: Lookup, Calendar, and Delete Tests
// Description: GraphQL lookups, calendar export, and user deletion.
// Purpose: Validate row visibility, calendar normalization, and cleanup.
// Dependencies: system-tests helpers
// ============================================================================

//! Lookup, calendar, and delete coverage for Flow regression system-tests.

use flow_regtest_api::ApiEnv;
use flow_regtest_api::phases::CalendarPhase;
use flow_regtest_api::phases::DeletePhase;
use flow_regtest_api::phases::LoginPhase;
use flow_regtest_api::phases::LookupPhase;
use flow_regtest_api::phases::RegisterPhase;
use flow_regtest_core::CalendarSecretSource;
use flow_regtest_core::Phase;
use helpers::artifacts::TestReporter;
use helpers::flow_stub::StubOptions;
use helpers::harness::FlowHarness;
use helpers::harness::count;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_user_once() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("delete_removes_user_once")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let phases = vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>, Box::new(DeletePhase)];
    let run = harness.run_phases(phases).await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    for name in [
        "user delete > unauthorized > count",
        "user delete > valid > count",
        "user delete > nonexistent > count",
        "user delete > lookup after delete > count",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }
    if harness.stub().user_count() != 0 {
        return Err("user should be gone after delete".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["delete affected one row, then none".to_string()],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "check_summary.json".to_string(),
        ],
    )?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn calendar_export_matches_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("calendar_export_matches_fixture")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let phases = vec![
        Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>,
        Box::new(LoginPhase),
        Box::new(CalendarPhase::new(CalendarSecretSource::Envelope)),
    ];
    let run = harness.run_phases(phases).await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    for name in [
        "calendar > valid > status",
        "calendar > valid > MIME type",
        "calendar > valid > correct body",
        "calendar > invalid > status",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["stamped calendar export matched the normalized fixture".to_string()],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "check_summary.json".to_string(),
        ],
    )?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn calendar_secret_can_come_from_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("calendar_secret_can_come_from_lookup")?;
    let options = StubOptions {
        calendar_prefix: "/schedule/ical".to_string(),
        calendar_success_status: 200,
        calendar_invalid_status: 404,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    let phases = vec![
        Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>,
        Box::new(LookupPhase),
        Box::new(CalendarPhase::new(CalendarSecretSource::Lookup)),
    ];
    let run = harness.run_phases(phases).await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    if count(&run.summary, "calendar > valid > correct body").passed != 1 {
        return Err("calendar body should be compared".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["lookup-sourced secret served under the alternate prefix".to_string()],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "check_summary.json".to_string(),
        ],
    )?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_hides_unrelated_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("lookup_hides_unrelated_rows")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let phases = vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>, Box::new(LookupPhase)];
    let run = harness.run_phases(phases).await?;

    for name in [
        "user lookup > unrelated user > count",
        "user lookup > own user > count",
        "user lookup > own user > name matches",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }
    let identity = run.context.email()?;
    let record = run.context.looked_up_user()?;
    if record.full_name != identity.name.full() {
        return Err(format!("unexpected full name {}", record.full_name).into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["lookup sees only the caller's row".to_string()],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "check_summary.json".to_string(),
        ],
    )?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_delete_reporting_a_row_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("repeated_delete_reporting_a_row_fails")?;
    let options = StubOptions {
        delete_always_affects_row: true,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    let phases = vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>, Box::new(DeletePhase)];
    let run = harness.run_phases(phases).await?;

    if run.summary.failing() != vec!["user delete > nonexistent > count"] {
        return Err(format!("unexpected failures: {:?}", run.summary.failing()).into());
    }
    if count(&run.summary, "user delete > valid > count").passed != 1 {
        return Err("first delete should still pass".into());
    }
    if harness.stub().user_count() != 0 {
        return Err("user should be gone after delete".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.artifacts().write_json("diagnostics.json", &run.diagnostics)?;
    reporter.finish(
        "pass",
        vec!["a second delete reporting a row fails the count check".to_string()],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "check_summary.json".to_string(),
            "diagnostics.json".to_string(),
        ],
    )?;
    drop(reporter);
    Ok(())
}
