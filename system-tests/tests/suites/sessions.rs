// system-tests/tests/suites/sessions.rs
// ============================================================================
// Module: Session Tests
// Description: Email and third-party login against the API stub.
// Purpose: Validate identity stability across repeated logins.
// Dependencies: system-tests helpers
// ============================================================================

//! Login coverage for Flow regression system-tests.

use flow_regtest_api::ApiEnv;
use flow_regtest_api::phases::FacebookLoginPhase;
use flow_regtest_api::phases::LoginPhase;
use flow_regtest_api::phases::RegisterPhase;
use flow_regtest_core::Phase;
use helpers::artifacts::TestReporter;
use helpers::flow_stub::StubOptions;
use helpers::harness::FlowHarness;
use helpers::harness::HarnessSettings;
use helpers::harness::count;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn login_returns_registered_user() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("login_returns_registered_user")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let phases = vec![Box::new(RegisterPhase) as Box<dyn Phase<ApiEnv>>, Box::new(LoginPhase)];
    let run = harness.run_phases(phases).await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    for name in [
        "email login > nonexistent email > error message",
        "email login > incorrect password > error message",
        "email login > correct credentials > user_id matches registration",
        "email login > correct credentials > context recorded",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }
    let identity = run.context.email()?;
    if !identity.token.starts_with(&format!("session-{}-", identity.user_id)) {
        return Err(format!("token {} was not issued for the user", identity.token).into());
    }
    if harness.stub().user_count() != 1 {
        return Err("login must not create users".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["login refined the session of the registered user".to_string()],
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
async fn facebook_login_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("facebook_login_is_stable")?;
    let harness = FlowHarness::start(StubOptions::default()).await?;
    let run = harness
        .run_phases(vec![Box::new(FacebookLoginPhase) as Box<dyn Phase<ApiEnv>>])
        .await?;

    if !run.summary.all_passed() {
        return Err(format!("failing checks: {:?}", run.summary.failing()).into());
    }
    for name in [
        "facebook login > missing token > error message",
        "facebook login > test user provisioned",
        "facebook login > valid token > keys",
        "facebook login > repeated login > same user_id",
        "facebook login > repeated login > same secret_id",
    ] {
        if count(&run.summary, name).passed != 1 {
            return Err(format!("{name} should pass exactly once").into());
        }
    }
    let identity = run.context.third_party()?;
    if harness.stub().user_count() != 1 {
        return Err(format!("expected one linked user for {}", identity.user_id).into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.finish(
        "pass",
        vec!["repeated third-party login returned the same identity".to_string()],
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
async fn facebook_login_without_credentials_fails_provisioning()
-> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("facebook_login_without_credentials_fails_provisioning")?;
    let settings = HarnessSettings {
        facebook: false,
        ..HarnessSettings::default()
    };
    let harness = FlowHarness::start_with(StubOptions::default(), settings).await?;
    let run = harness
        .run_phases(vec![Box::new(FacebookLoginPhase) as Box<dyn Phase<ApiEnv>>])
        .await?;

    if count(&run.summary, "facebook login > missing token > status").passed != 1 {
        return Err("missing-token case should still run".into());
    }
    if run.summary.failing() != vec!["facebook login > test user provisioned"] {
        return Err(format!("unexpected failures: {:?}", run.summary.failing()).into());
    }
    if run.context.third_party().is_ok() {
        return Err("no third-party identity should be recorded".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.artifacts().write_json("diagnostics.json", &run.diagnostics)?;
    reporter.finish(
        "pass",
        vec!["unprovisioned third-party login fails one named check".to_string()],
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
async fn facebook_relogin_as_new_user_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("facebook_relogin_as_new_user_fails")?;
    let options = StubOptions {
        relink_facebook_logins: true,
        facebook_extra_key: true,
        ..StubOptions::default()
    };
    let harness = FlowHarness::start(options).await?;
    let run = harness
        .run_phases(vec![Box::new(FacebookLoginPhase) as Box<dyn Phase<ApiEnv>>])
        .await?;

    let expected = vec![
        "facebook login > repeated login > same secret_id",
        "facebook login > repeated login > same user_id",
        "facebook login > valid token > keys",
    ];
    if run.summary.failing() != expected {
        return Err(format!("unexpected failures: {:?}", run.summary.failing()).into());
    }
    if count(&run.summary, "facebook login > repeated login > first login decoded").passed != 1 {
        return Err("first login ids should be read from its response".into());
    }
    if run.context.third_party().is_ok() {
        return Err("a malformed envelope must not be recorded".into());
    }
    if harness.stub().user_count() != 2 {
        return Err("stub should hold one user per login".into());
    }

    reporter.artifacts().write_json("check_summary.json", &run.summary)?;
    reporter.artifacts().write_json("diagnostics.json", &run.diagnostics)?;
    reporter.finish(
        "pass",
        vec!["a second account on re-login fails the identity checks".to_string()],
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
