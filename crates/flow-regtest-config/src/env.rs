// crates/flow-regtest-config/src/env.rs
// ============================================================================
// Module: Environment Overrides
// Description: Environment-backed overrides for the harness configuration.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed, as does a variable that is
//! set but empty. Credentials for the third-party provider must be supplied
//! together or not at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys read by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegtestEnv {
    /// Config file path used when no explicit path is given.
    ConfigPath,
    /// REST API base URL override.
    ApiUrl,
    /// GraphQL endpoint override.
    GraphqlUrl,
    /// Facebook application id.
    FacebookAppId,
    /// Facebook application secret.
    FacebookAppSecret,
    /// Request timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Artifact root override.
    RunRoot,
}

impl RegtestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "FLOW_REGTEST_CONFIG",
            Self::ApiUrl => "FLOW_REGTEST_API_URL",
            Self::GraphqlUrl => "FLOW_REGTEST_GRAPHQL_URL",
            Self::FacebookAppId => "FB_APP_ID",
            Self::FacebookAppSecret => "FB_APP_SECRET",
            Self::TimeoutSeconds => "FLOW_REGTEST_TIMEOUT_SEC",
            Self::RunRoot => "FLOW_REGTEST_RUN_ROOT",
        }
    }
}

// ============================================================================
// SECTION: Override Types
// ============================================================================

/// Facebook application credentials supplied through the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookCredentials {
    /// Application id.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
}

/// Typed overrides derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvOverrides {
    /// REST API base URL.
    pub api_url: Option<String>,
    /// GraphQL endpoint.
    pub graphql_url: Option<String>,
    /// Facebook credentials, only when both variables are set.
    pub facebook: Option<FacebookCredentials>,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Artifact root.
    pub run_root: Option<PathBuf>,
}

impl EnvOverrides {
    /// Loads overrides from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, a zero timeout or a lone credential).
    pub fn from_env() -> Result<Self, String> {
        let api_url = read_env_nonempty(RegtestEnv::ApiUrl.as_str())?;
        let graphql_url = read_env_nonempty(RegtestEnv::GraphqlUrl.as_str())?;
        let app_id = read_env_nonempty(RegtestEnv::FacebookAppId.as_str())?;
        let app_secret = read_env_nonempty(RegtestEnv::FacebookAppSecret.as_str())?;
        let facebook = match (app_id, app_secret) {
            (Some(app_id), Some(app_secret)) => Some(FacebookCredentials {
                app_id,
                app_secret,
            }),
            (None, None) => None,
            _ => {
                return Err(format!(
                    "{} and {} must be set together",
                    RegtestEnv::FacebookAppId.as_str(),
                    RegtestEnv::FacebookAppSecret.as_str()
                ));
            }
        };
        let timeout = read_env_nonempty(RegtestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(RegtestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let run_root = read_env_nonempty(RegtestEnv::RunRoot.as_str())?.map(PathBuf::from);
        Ok(Self {
            api_url,
            graphql_url,
            facebook,
            timeout,
            run_root,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
pub fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
