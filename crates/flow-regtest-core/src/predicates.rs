// crates/flow-regtest-core/src/predicates.rs
// ============================================================================
// Module: Predicate Builders
// Description: Reusable predicates for status, error codes, and envelopes.
// Purpose: Keep phase check tables declarative.
// Dependencies: crate::{keys, response}, serde_json
// ============================================================================

//! ## Overview
//! Each builder returns a closure suitable for [`crate::CheckSet::check`].
//! Builders that read the body raise when the body is not JSON, so a
//! malformed body is logged with the `[!]` marker instead of a quiet `false`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::keys::keys_are_exactly;
use crate::response::ApiResponse;
use crate::response::PredicateError;

/// JSON field carrying the API's machine-readable error code.
pub const ERROR_FIELD: &str = "error";

// ============================================================================
// SECTION: Status and Headers
// ============================================================================

/// Passes when the status code equals `expected`.
pub fn status_is(
    expected: u16,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| Ok(response.status() == expected)
}

/// Passes when a header equals `expected`, ignoring `; charset=...` suffixes.
pub fn header_is(
    name: &'static str,
    expected: &'static str,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| {
        let value = response.header(name).unwrap_or_default();
        let media = value.split(';').next().unwrap_or_default().trim();
        Ok(media.eq_ignore_ascii_case(expected))
    }
}

// ============================================================================
// SECTION: Body
// ============================================================================

/// Passes when the `error` field is one of `codes`.
pub fn error_code_in(
    codes: &'static [&'static str],
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| {
        let code = response.json_at(ERROR_FIELD)?;
        Ok(code.as_ref().and_then(Value::as_str).is_some_and(|code| codes.contains(&code)))
    }
}

/// Passes when the value at `path` is an object with exactly `keys`.
pub fn keys_exactly(
    path: &'static str,
    keys: &'static [&'static str],
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| Ok(keys_are_exactly(response.json_at(path)?.as_ref(), keys))
}

/// Passes when the value at `path` is the integer `expected`.
pub fn json_i64_eq(
    path: &'static str,
    expected: i64,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| Ok(response.json_at(path)?.as_ref().and_then(Value::as_i64) == Some(expected))
}

/// Passes when the value at `path` is the string `expected`.
pub fn json_str_eq(
    path: &'static str,
    expected: impl Into<String>,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    let expected = expected.into();
    move |response| {
        Ok(response.json_at(path)?.as_ref().and_then(Value::as_str) == Some(expected.as_str()))
    }
}

/// Passes when the array at `path` has exactly `expected` elements.
///
/// Raises when the path is missing or not an array.
pub fn array_len_is(
    path: &'static str,
    expected: usize,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| Ok(array_len(response, path)? == expected)
}

/// Passes when the array at `path` has more than `minimum` elements.
///
/// Raises when the path is missing or not an array.
pub fn array_len_greater_than(
    path: &'static str,
    minimum: usize,
) -> impl Fn(&ApiResponse) -> Result<bool, PredicateError> + Send + Sync + 'static {
    move |response| Ok(array_len(response, path)? > minimum)
}

/// Returns the length of the array at `path`.
///
/// # Errors
///
/// Returns [`PredicateError`] when the body is not JSON, the path is missing,
/// or the value is not an array.
pub fn array_len(response: &ApiResponse, path: &str) -> Result<usize, PredicateError> {
    match response.json_at(path)? {
        Some(Value::Array(items)) => Ok(items.len()),
        Some(_) => Err(PredicateError::WrongType {
            path: path.to_string(),
            expected: "an array",
        }),
        None => Err(PredicateError::MissingValue(path.to_string())),
    }
}
