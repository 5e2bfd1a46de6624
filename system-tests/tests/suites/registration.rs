// system-tests/tests/suites/registration.rs
// ============================================================================
// Module: Registration Tests
// Description: Email registration against the API stub.
// Purpose: Validate rejection paths, the auth envelope, and duplicate handling.
// Dependencies: system-tests helpers
// ============================================================================

//! Registration coverage for Flow regression system-tests.

use flow_regtest_api::ApiEnv;
use flow_regtest_api::phases::LookupPhase;
use flow_regtest_api::phases::RegisterPhase;
use flow_regtest_core::ContextError;
use flow_regtest_core::ContextField;
use flow_regtest_core::Phase;
use helpers::artifacts::TestReporter;
use helpers::flow_stub::StubOptions;
use helpers::harness::FlowHarness;
use helpers::harness::count;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn rejected_registration_records_no_identity() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("rejected_registration_records_no_identity")?;
    let options = StubOptions {
        reject_registration: true,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    let run = harness.run_phases(vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>]).await?;

    for check in ["status", "error message"] {
        let name = format!("email register > empty fields > {check}");
        let tally = count(&run.summary, &name);
        if tally.passed != 4 || tally.failed != 0 {
            return Err(format!("{name}: expected 4 passes, got {tally:?}").into());
        }
        let name = format!("email register > short fields > {check}");
        if count(&run.summary, &name).passed != 2 {
            return Err(format!("{name}: expected 2 passes").into());
        }
    }
    if count(&run.summary, "email register > valid registration > status").failed != 1 {
        return Err("server error on valid registration should fail the status check".into());
    }
    if !matches!(run.context.email(), Err(ContextError::Missing(ContextField::EmailIdentity))) {
        return Err("email identity must stay unrecorded after a failed registration".into());
    }
    if harness.stub().user_count() != 0 {
        return Err("stub should hold no users".into());
    }
    let logged = run
        .diagnostics
        .iter()
        .any(|line| line.contains("vu=1 it=0 [*] email register > valid registration > status"));
    if !logged {
        return Err(format!("missing status diagnostic in {:?}", run.diagnostics).into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.artifacts().write_json("diagnostics.json", &run.diagnostics)?;
    reporter.finish(
        "pass",
        vec!["rejected registration left the context empty".to_string()],
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

#[tokio::test(flavor = "multi_thread")]
async fn valid_registration_is_unique() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("valid_registration_is_unique")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let phases = vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>, Box::new(LookupPhase)];
    let run = harness.run_phases(phases).await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    for name in [
        "email register > valid registration > keys",
        "email register > valid registration > context recorded",
        "email register > duplicate registration > error message",
        "user lookup > by email > count",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }
    let identity = run.context.email()?;
    if identity.name.full() != "Test User 1" {
        return Err(format!("unexpected name {}", identity.name.full()).into());
    }
    if harness.stub().users_with_email(&identity.email) != 1 {
        return Err("duplicate registration created a second user".into());
    }
    let record = run.context.looked_up_user()?;
    if record.id != identity.user_id || record.secret_id != identity.secret_id {
        return Err("lookup row does not match the registration envelope".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["registration recorded one user and rejected the duplicate".to_string()],
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
async fn duplicate_status_follows_policy() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("duplicate_status_follows_policy")?;
    let options = StubOptions {
        duplicate_status: 409,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    if harness.config().policy.duplicate_registration_status != 409 {
        return Err("config should carry the stub's duplicate status".into());
    }
    let run = harness.run_phases(vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>]).await?;

    if count(&run.summary, "email register > duplicate registration > status").passed != 1 {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["duplicate registration status is configurable".to_string()],
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
async fn accepted_duplicate_registration_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("accepted_duplicate_registration_fails")?;
    let options = StubOptions {
        accept_duplicate_registration: true,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    let run = harness.run_phases(vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>]).await?;

    let expected = vec![
        "email register > duplicate registration > error message",
        "email register > duplicate registration > status",
    ];
    if run.summary.failing() != expected {
        return Err(format!("unexpected failures: {:?}", run.summary.failing()).into());
    }
    if count(&run.summary, "email register > valid registration > status").passed != 1 {
        return Err("first registration should still pass".into());
    }
    let logged = run.diagnostics.iter().any(|line| {
        line.starts_with("vu=1 it=0 [*] email register > duplicate registration > status")
    });
    if !logged {
        return Err(format!("missing duplicate diagnostic in {:?}", run.diagnostics).into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.artifacts().write_json("diagnostics.json", &run.diagnostics)?;
    reporter.finish(
        "pass",
        vec!["a server that accepts the same email twice fails the duplicate checks".to_string()],
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
