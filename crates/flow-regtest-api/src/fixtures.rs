// crates/flow-regtest-api/src/fixtures.rs
// ============================================================================
// Module: Fixtures
// Description: Upload and comparison fixtures loaded once per process.
// Purpose: Read fixture files with size limits and normalize calendars.
// Dependencies: thiserror, flow-regtest-config
// ============================================================================

//! ## Overview
//! Fixtures are read before any run starts and shared read-only across
//! virtual users. Calendar fixtures are normalized by dropping `DTSTAMP`
//! lines, the only field that changes between otherwise identical exports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use flow_regtest_config::FixturesConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum fixture size in bytes.
pub const MAX_FIXTURE_SIZE: u64 = 16 * 1024 * 1024;

/// Upload file name when the fixture path has none.
const DEFAULT_TRANSCRIPT_NAME: &str = "transcript.pdf";

/// Calendar line prefix that varies between exports.
const TIMESTAMP_PREFIX: &str = "DTSTAMP";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fixture loading failures.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// File could not be read.
    #[error("failed to read fixture {path}: {message}")]
    Read {
        /// Fixture path.
        path: String,
        /// I/O error text.
        message: String,
    },
    /// Text fixture is not UTF-8.
    #[error("fixture {0} is not valid UTF-8")]
    NotUtf8(String),
    /// Fixture is empty.
    #[error("fixture {0} is empty")]
    Empty(String),
    /// Fixture exceeds [`MAX_FIXTURE_SIZE`].
    #[error("fixture {0} exceeds size limit")]
    TooLarge(String),
}

/// Fixture contents shared by every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixtures {
    /// Schedule text posted to `/parse/schedule`.
    pub schedule_text: String,
    /// Sections the schedule must import.
    pub schedule_sections: u64,
    /// Transcript bytes posted to `/parse/transcript`.
    pub transcript: Vec<u8>,
    /// Transcript upload file name.
    pub transcript_name: String,
    /// Courses the transcript must import.
    pub transcript_courses: u64,
    /// Expected calendar body after normalization.
    pub calendar: Option<String>,
}

impl Fixtures {
    /// Reads every configured fixture.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when a file is unreadable, empty, too large,
    /// or not UTF-8 where text is required.
    pub fn load(config: &FixturesConfig) -> Result<Self, FixtureError> {
        let schedule_text = read_text(&config.schedule_path)?;
        let transcript = read_bytes(&config.transcript_path)?;
        let transcript_name = config.transcript_path.file_name().map_or_else(
            || DEFAULT_TRANSCRIPT_NAME.to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let calendar = config
            .calendar_path
            .as_deref()
            .map(read_text)
            .transpose()?
            .map(|text| normalize_calendar(&text));
        Ok(Self {
            schedule_text,
            schedule_sections: config.schedule_sections,
            transcript,
            transcript_name,
            transcript_courses: config.transcript_courses,
            calendar,
        })
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Drops `DTSTAMP` lines and joins the rest with `\n`.
///
/// Line endings are normalized, so `\r\n` exports compare equal to fixtures
/// saved with `\n`.
#[must_use]
pub fn normalize_calendar(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(TIMESTAMP_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a fixture as raw bytes within the size limit.
fn read_bytes(path: &Path) -> Result<Vec<u8>, FixtureError> {
    let display = path.display().to_string();
    let metadata = fs::metadata(path).map_err(|err| FixtureError::Read {
        path: display.clone(),
        message: err.to_string(),
    })?;
    if metadata.len() > MAX_FIXTURE_SIZE {
        return Err(FixtureError::TooLarge(display));
    }
    let bytes = fs::read(path).map_err(|err| FixtureError::Read {
        path: display.clone(),
        message: err.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(FixtureError::Empty(display));
    }
    Ok(bytes)
}

/// Reads a fixture as UTF-8 text.
fn read_text(path: &Path) -> Result<String, FixtureError> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|_| FixtureError::NotUtf8(path.display().to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
