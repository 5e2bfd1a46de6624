// crates/flow-regtest-cli/src/main.rs
// ============================================================================
// Module: Flow Regression CLI Entry Point
// Description: Command dispatcher for harness runs and config validation.
// Purpose: Load config, run virtual users, and persist run artifacts.
// Dependencies: clap, flow-regtest-api, flow-regtest-config, tokio
// ============================================================================

//! ## Overview
//! `flow-regtest run` loads configuration, validates the phase plan, spawns
//! the configured virtual users, and writes `summary.json` plus `summary.md`
//! into a per-run directory. The process exits non-zero when any check
//! failed. `flow-regtest check-config` validates configuration and phase
//! contracts without sending a request.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod artifacts;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use flow_regtest_api::ApiEnv;
use flow_regtest_api::build_plan;
use flow_regtest_config::FlowRegtestConfig;
use flow_regtest_core::CheckTally;
use flow_regtest_core::DiagnosticSink;
use flow_regtest_core::FanoutDiagnosticSink;
use flow_regtest_core::FileDiagnosticSink;
use flow_regtest_core::RunNonce;
use flow_regtest_core::RunSettings;
use flow_regtest_core::RunSinks;
use flow_regtest_core::StderrDiagnosticSink;
use flow_regtest_core::run_virtual_users;
use thiserror::Error;

use crate::artifacts::DEFAULT_RUN_ROOT;
use crate::artifacts::RunArtifacts;
use crate::artifacts::RunReport;
use crate::artifacts::now_millis;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "flow-regtest", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every phase against the configured deployment.
    Run(RunCommand),
    /// Validate configuration and phase contracts without sending requests.
    CheckConfig(ConfigArgs),
}

/// Config file selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// Config file path (defaults to `FLOW_REGTEST_CONFIG`, then
    /// `flow-regtest.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `run`.
#[derive(Args, Debug, Clone, Default)]
struct RunCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Concurrent virtual users (overrides `run.virtual_users`).
    #[arg(long = "vus", value_name = "N")]
    virtual_users: Option<u32>,
    /// Iterations per virtual user (overrides `run.iterations`).
    #[arg(long, value_name = "N")]
    iterations: Option<u32>,
    /// Artifact root (overrides `run.run_root`).
    #[arg(long, value_name = "DIR")]
    run_root: Option<PathBuf>,
    /// Diagnostics JSON-lines file (overrides `run.diagnostics_path`).
    #[arg(long, value_name = "PATH")]
    diagnostics: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::CheckConfig(args) => command_check_config(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_config(&command)?;
    let plan = build_plan(&config)
        .map_err(|err| CliError::new(format!("invalid phase plan: {err}")))?;
    let env = ApiEnv::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to prepare run: {err}")))?;

    let nonce = RunNonce::generate();
    let run_root = config.run.run_root.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_ROOT));
    let artifacts = RunArtifacts::create(&run_root, &nonce)
        .map_err(|err| CliError::new(format!("failed to create run directory: {err}")))?;
    let diagnostics_path =
        config.run.diagnostics_path.clone().unwrap_or_else(|| artifacts.diagnostics_path());
    let file_sink = FileDiagnosticSink::new(&diagnostics_path).map_err(|err| {
        CliError::new(format!("failed to open {}: {err}", diagnostics_path.display()))
    })?;
    let diagnostics: Vec<Arc<dyn DiagnosticSink>> =
        vec![Arc::new(StderrDiagnosticSink), Arc::new(file_sink)];
    let tally = Arc::new(CheckTally::new());
    let sinks = RunSinks {
        checks: tally.clone(),
        diagnostics: Arc::new(FanoutDiagnosticSink::new(diagnostics)),
    };
    let settings = RunSettings {
        virtual_users: config.run.virtual_users,
        iterations: config.run.iterations,
    };

    let started_at_ms = now_millis();
    let completed_runs =
        run_virtual_users(Arc::new(plan), Arc::new(env), settings, sinks, nonce.clone())
            .await
            .map_err(|err| CliError::new(format!("run failed: {err}")))?;
    let report = RunReport {
        nonce: nonce.to_string(),
        virtual_users: settings.virtual_users,
        iterations: settings.iterations,
        completed_runs,
        started_at_ms,
        ended_at_ms: now_millis(),
        summary: tally.summary(),
    };
    let [summary_json, _] = artifacts
        .write_summary(&report)
        .map_err(|err| CliError::new(format!("failed to write summary: {err}")))?;

    write_stdout_line(&format!(
        "{}: {} checks passed, {} failed over {} runs",
        report.status(),
        report.summary.total_passed,
        report.summary.total_failed,
        report.completed_runs
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&format!("summary: {}", summary_json.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if report.summary.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes the `check-config` command.
fn command_check_config(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = FlowRegtestConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let plan = build_plan(&config)
        .map_err(|err| CliError::new(format!("invalid phase plan: {err}")))?;
    write_stdout_line("config ok")
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for (index, id) in plan.phase_ids().iter().enumerate() {
        write_stdout_line(&format!("{}. {id}", index + 1))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads config and applies `run` overrides, re-validating the result.
fn load_config(command: &RunCommand) -> CliResult<FlowRegtestConfig> {
    let mut config = FlowRegtestConfig::load(command.config.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    apply_run_overrides(&mut config, command);
    config.validate().map_err(|err| CliError::new(format!("invalid overrides: {err}")))?;
    Ok(config)
}

/// Applies command-line overrides to the `[run]` section.
fn apply_run_overrides(config: &mut FlowRegtestConfig, command: &RunCommand) {
    if let Some(virtual_users) = command.virtual_users {
        config.run.virtual_users = virtual_users;
    }
    if let Some(iterations) = command.iterations {
        config.run.iterations = iterations;
    }
    if let Some(run_root) = &command.run_root {
        config.run.run_root = Some(run_root.clone());
    }
    if let Some(diagnostics) = &command.diagnostics {
        config.run.diagnostics_path = Some(diagnostics.clone());
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
