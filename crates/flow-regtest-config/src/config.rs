// crates/flow-regtest-config/src/config.rs
// ============================================================================
// Module: Flow Regression Harness Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: flow-regtest-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with environment overrides (see [`crate::env`]). Relative
//! fixture paths resolve against the directory holding the config file.
//! Missing or invalid configuration fails closed before any request is sent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use flow_regtest_core::CalendarSecretSource;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::env::EnvOverrides;
use crate::env::RegtestEnv;
use crate::env::read_env_nonempty;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "flow-regtest.toml";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum request timeout in seconds.
pub(crate) const MAX_TIMEOUT_SEC: u64 = 300;
/// Maximum number of concurrent virtual users.
pub(crate) const MAX_VIRTUAL_USERS: u32 = 1024;
/// Maximum iterations per virtual user.
pub(crate) const MAX_ITERATIONS: u32 = 10_000;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SEC: u64 = 10;
/// Default Graph API root for test-user provisioning.
const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v5.0";
/// Default status for a duplicate registration.
const DEFAULT_DUPLICATE_REGISTRATION_STATUS: u16 = 401;
/// Default status for a successful calendar export.
const DEFAULT_CALENDAR_SUCCESS_STATUS: u16 = 201;
/// Default status for an unknown calendar secret.
const DEFAULT_CALENDAR_INVALID_STATUS: u16 = 401;
/// Default calendar path prefix.
const DEFAULT_CALENDAR_PATH_PREFIX: &str = "/calendar";
/// Default lower bound on dumped courses.
const DEFAULT_MIN_COURSES: u64 = 7000;
/// Default lower bound on dumped professors.
const DEFAULT_MIN_PROFS: u64 = 5000;

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Root harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowRegtestConfig {
    /// API endpoints and transport settings.
    pub api: ApiConfig,
    /// Third-party login settings; the facebook phase runs only when present.
    #[serde(default)]
    pub facebook: Option<FacebookConfig>,
    /// Upload fixtures and their expected counts.
    pub fixtures: FixturesConfig,
    /// Server behavior policies.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Data dump thresholds.
    #[serde(default)]
    pub dump: DumpConfig,
    /// Run shape and artifact locations.
    #[serde(default)]
    pub run: RunConfig,
}

/// API endpoints and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// REST base URL, without a trailing slash after validation.
    pub base_url: String,
    /// GraphQL endpoint.
    pub graphql_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

/// Facebook application used to provision test users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacebookConfig {
    /// Application id.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
    /// Graph API root.
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

/// Upload fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixturesConfig {
    /// Schedule text fixture.
    pub schedule_path: PathBuf,
    /// Sections the schedule fixture imports.
    pub schedule_sections: u64,
    /// Transcript PDF fixture.
    pub transcript_path: PathBuf,
    /// Courses the transcript fixture imports.
    pub transcript_courses: u64,
    /// Expected calendar export; body comparison is skipped when absent.
    #[serde(default)]
    pub calendar_path: Option<PathBuf>,
}

/// Server behavior the harness asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Status of a duplicate registration.
    #[serde(default = "default_duplicate_registration_status")]
    pub duplicate_registration_status: u16,
    /// Status of a successful calendar export.
    #[serde(default = "default_calendar_success_status")]
    pub calendar_success_status: u16,
    /// Status of an export with an unknown secret.
    #[serde(default = "default_calendar_invalid_status")]
    pub calendar_invalid_status: u16,
    /// Calendar path prefix (`/calendar` or `/schedule/ical`).
    #[serde(default = "default_calendar_path_prefix")]
    pub calendar_path_prefix: String,
    /// Where the calendar secret id comes from.
    #[serde(default)]
    pub calendar_secret_source: CalendarSecretSource,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            duplicate_registration_status: DEFAULT_DUPLICATE_REGISTRATION_STATUS,
            calendar_success_status: DEFAULT_CALENDAR_SUCCESS_STATUS,
            calendar_invalid_status: DEFAULT_CALENDAR_INVALID_STATUS,
            calendar_path_prefix: DEFAULT_CALENDAR_PATH_PREFIX.to_string(),
            calendar_secret_source: CalendarSecretSource::default(),
        }
    }
}

/// Data dump thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// Courses must exceed this count.
    #[serde(default = "default_min_courses")]
    pub min_courses: u64,
    /// Professors must exceed this count.
    #[serde(default = "default_min_profs")]
    pub min_profs: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            min_courses: DEFAULT_MIN_COURSES,
            min_profs: DEFAULT_MIN_PROFS,
        }
    }
}

/// Run shape and artifact locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Concurrent virtual users.
    #[serde(default = "default_one")]
    pub virtual_users: u32,
    /// Sequential iterations per virtual user.
    #[serde(default = "default_one")]
    pub iterations: u32,
    /// Directory receiving run artifacts, relative to the working directory.
    #[serde(default)]
    pub run_root: Option<PathBuf>,
    /// JSON-lines diagnostics file, relative to the working directory.
    #[serde(default)]
    pub diagnostics_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            virtual_users: 1,
            iterations: 1,
            run_root: None,
            diagnostics_path: None,
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl FlowRegtestConfig {
    /// Loads configuration from disk, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let overrides = EnvOverrides::from_env().map_err(ConfigError::Invalid)?;
        Self::load_with(path, &overrides)
    }

    /// Loads configuration from disk with explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with(path: Option<&Path>, overrides: &EnvOverrides) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_overrides(overrides);
        if let Some(base) = resolved.parent() {
            config.resolve_relative_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlays environment overrides onto the file configuration.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) {
        if let Some(api_url) = &overrides.api_url {
            self.api.base_url.clone_from(api_url);
        }
        if let Some(graphql_url) = &overrides.graphql_url {
            self.api.graphql_url.clone_from(graphql_url);
        }
        if let Some(timeout) = overrides.timeout {
            self.api.timeout_sec = timeout.as_secs();
        }
        if let Some(credentials) = &overrides.facebook {
            let graph_url = self
                .facebook
                .as_ref()
                .map_or_else(default_graph_url, |facebook| facebook.graph_url.clone());
            self.facebook = Some(FacebookConfig {
                app_id: credentials.app_id.clone(),
                app_secret: credentials.app_secret.clone(),
                graph_url,
            });
        }
        if let Some(run_root) = &overrides.run_root {
            self.run.run_root = Some(run_root.clone());
        }
    }

    /// Anchors relative fixture paths at `base`.
    ///
    /// `run.run_root` and `run.diagnostics_path` stay relative to the working
    /// directory, matching the command-line and environment overrides.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        anchor(&mut self.fixtures.schedule_path);
        anchor(&mut self.fixtures.transcript_path);
        if let Some(path) = self.fixtures.calendar_path.as_mut() {
            anchor(path);
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// Normalizes the REST base URL by dropping trailing slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.api.validate()?;
        if let Some(facebook) = &self.facebook {
            facebook.validate()?;
        }
        self.fixtures.validate()?;
        self.policy.validate()?;
        self.dump.validate()?;
        self.run.validate()?;
        Ok(())
    }
}

impl ApiConfig {
    /// Validates endpoints and the timeout.
    fn validate(&mut self) -> Result<(), ConfigError> {
        validate_http_url("api.base_url", &self.base_url)?;
        validate_http_url("api.graphql_url", &self.graphql_url)?;
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        self.base_url = trimmed;
        if self.timeout_sec == 0 || self.timeout_sec > MAX_TIMEOUT_SEC {
            return Err(ConfigError::Invalid(format!(
                "api.timeout_sec must be between 1 and {MAX_TIMEOUT_SEC}"
            )));
        }
        Ok(())
    }
}

impl FacebookConfig {
    /// Validates credentials and the Graph API root.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid("facebook.app_id must be non-empty".to_string()));
        }
        if self.app_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("facebook.app_secret must be non-empty".to_string()));
        }
        validate_http_url("facebook.graph_url", &self.graph_url)
    }
}

impl FixturesConfig {
    /// Validates fixture paths and counts.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("fixtures.schedule_path", &self.schedule_path.to_string_lossy())?;
        validate_path_string("fixtures.transcript_path", &self.transcript_path.to_string_lossy())?;
        if let Some(path) = &self.calendar_path {
            validate_path_string("fixtures.calendar_path", &path.to_string_lossy())?;
        }
        if self.schedule_sections == 0 {
            return Err(ConfigError::Invalid(
                "fixtures.schedule_sections must be greater than zero".to_string(),
            ));
        }
        if self.transcript_courses == 0 {
            return Err(ConfigError::Invalid(
                "fixtures.transcript_courses must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl PolicyConfig {
    /// Validates status ranges and the calendar prefix.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_status(
            "policy.duplicate_registration_status",
            self.duplicate_registration_status,
            400..=499,
        )?;
        validate_status("policy.calendar_success_status", self.calendar_success_status, 200..=299)?;
        validate_status("policy.calendar_invalid_status", self.calendar_invalid_status, 400..=499)?;
        let prefix = &self.calendar_path_prefix;
        if !prefix.starts_with('/') || prefix.ends_with('/') || prefix.contains(char::is_whitespace)
        {
            return Err(ConfigError::Invalid(
                "policy.calendar_path_prefix must start with `/` and not end with `/`".to_string(),
            ));
        }
        Ok(())
    }
}

impl DumpConfig {
    /// Validates thresholds.
    fn validate(self) -> Result<(), ConfigError> {
        if self.min_courses == 0 || self.min_profs == 0 {
            return Err(ConfigError::Invalid(
                "dump.min_courses and dump.min_profs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl RunConfig {
    /// Validates run shape and artifact paths.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_users == 0 || self.virtual_users > MAX_VIRTUAL_USERS {
            return Err(ConfigError::Invalid(format!(
                "run.virtual_users must be between 1 and {MAX_VIRTUAL_USERS}"
            )));
        }
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::Invalid(format!(
                "run.iterations must be between 1 and {MAX_ITERATIONS}"
            )));
        }
        if let Some(path) = &self.run_root {
            validate_path_string("run.run_root", &path.to_string_lossy())?;
        }
        if let Some(path) = &self.diagnostics_path {
            validate_path_string("run.diagnostics_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) =
        read_env_nonempty(RegtestEnv::ConfigPath.as_str()).map_err(ConfigError::Invalid)?
    {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an absolute http(s) URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid(format!("{field} must not carry a query or fragment")));
    }
    Ok(())
}

/// Validates that a configured status falls in `range`.
fn validate_status(
    field: &str,
    status: u16,
    range: std::ops::RangeInclusive<u16>,
) -> Result<(), ConfigError> {
    if range.contains(&status) {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "{field} must be between {} and {}",
        range.start(),
        range.end()
    )))
}

/// Serde default for `api.timeout_sec`.
const fn default_timeout_sec() -> u64 {
    DEFAULT_TIMEOUT_SEC
}

/// Serde default for `facebook.graph_url`.
fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

/// Serde default for `policy.duplicate_registration_status`.
const fn default_duplicate_registration_status() -> u16 {
    DEFAULT_DUPLICATE_REGISTRATION_STATUS
}

/// Serde default for `policy.calendar_success_status`.
const fn default_calendar_success_status() -> u16 {
    DEFAULT_CALENDAR_SUCCESS_STATUS
}

/// Serde default for `policy.calendar_invalid_status`.
const fn default_calendar_invalid_status() -> u16 {
    DEFAULT_CALENDAR_INVALID_STATUS
}

/// Serde default for `policy.calendar_path_prefix`.
fn default_calendar_path_prefix() -> String {
    DEFAULT_CALENDAR_PATH_PREFIX.to_string()
}

/// Serde default for `dump.min_courses`.
const fn default_min_courses() -> u64 {
    DEFAULT_MIN_COURSES
}

/// Serde default for `dump.min_profs`.
const fn default_min_profs() -> u64 {
    DEFAULT_MIN_PROFS
}

/// Serde default for run counts.
const fn default_one() -> u32 {
    1
}

// ============================================================================
// SECTION: Tests
// ============================================================================
