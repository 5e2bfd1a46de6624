// crates/flow-regtest-core/src/response.rs
// ============================================================================
// Module: API Response Model
// Description: Transport-neutral snapshot of one HTTP exchange.
// Purpose: Give predicates a fully buffered response to inspect.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every request issued by a phase is buffered into an [`ApiResponse`] before
//! any check runs. A request that never produced a response is carried as a
//! [`TransportError`] instead, so both shapes travel together as an
//! [`Exchange`].
//!
//! JSON field selection uses dotted paths (`data.user.0.full_name`), mapped
//! onto JSON pointers. An empty path selects the document root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of issuing one request: a buffered response or a transport failure.
pub type Exchange = Result<ApiResponse, TransportError>;

/// Failure to obtain any response from the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
    /// The transport gave up waiting for a response.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The response body could not be read to completion.
    #[error("response body unreadable: {0}")]
    Body(String),
}

/// Error raised by a predicate while inspecting a response.
///
/// A raised error is a distinct failure channel from a predicate returning
/// `false`; diagnostics mark the two differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// Body could not be decoded as JSON.
    #[error("response body is not valid json: {0}")]
    MalformedJson(String),
    /// Body is not UTF-8 text.
    #[error("response body is not valid utf-8")]
    NonUtf8Body,
    /// The dotted path selected nothing.
    #[error("no value at `{0}`")]
    MissingValue(String),
    /// The dotted path selected a value of the wrong JSON type.
    #[error("value at `{path}` is not {expected}")]
    WrongType {
        /// Dotted path that was inspected.
        path: String,
        /// Expected JSON type label.
        expected: &'static str,
    },
    /// Free-form failure raised by a hand-written predicate.
    #[error("{0}")]
    Failed(String),
}

/// Buffered HTTP response.
///
/// # Invariants
/// - Header names are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    status: u16,
    /// Response headers keyed by lowercased name.
    headers: BTreeMap<String, String>,
    /// Raw response body.
    body: Vec<u8>,
}

impl ApiResponse {
    /// Builds a response snapshot, normalizing header names.
    #[must_use]
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        let headers =
            headers.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Builds a response with a JSON body and matching content type.
    #[must_use]
    pub fn json_body(status: u16, value: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(status, headers, value.to_string().into_bytes())
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::NonUtf8Body`] when the body is not UTF-8.
    pub fn text(&self) -> Result<&str, PredicateError> {
        std::str::from_utf8(&self.body).map_err(|_| PredicateError::NonUtf8Body)
    }

    /// Parses the whole body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::MalformedJson`] when the body is not JSON.
    pub fn json(&self) -> Result<Value, PredicateError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| PredicateError::MalformedJson(err.to_string()))
    }

    /// Selects a value from the JSON body by dotted path.
    ///
    /// Returns `Ok(None)` when the body parses but the path selects nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::MalformedJson`] when the body is not JSON.
    pub fn json_at(&self, path: &str) -> Result<Option<Value>, PredicateError> {
        let document = self.json()?;
        Ok(document.pointer(&dotted_to_pointer(path)).cloned())
    }

    /// Renders the body for diagnostics.
    ///
    /// Prefers compact JSON; falls back to raw text, then to a status line
    /// when the body is empty.
    #[must_use]
    pub fn describe(&self) -> String {
        if let Ok(value) = self.json() {
            return value.to_string();
        }
        if self.body.is_empty() {
            return format!("status {} with empty body", self.status);
        }
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a dotted path (`a.b.0`) into a JSON pointer (`/a/b/0`).
#[must_use]
pub fn dotted_to_pointer(path: &str) -> String {
    let mut pointer = String::new();
    if path.is_empty() {
        return pointer;
    }
    for segment in path.split('.') {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        let _ = write!(pointer, "/{escaped}");
    }
    pointer
}
