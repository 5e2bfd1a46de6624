// crates/flow-regtest-api/src/envelope.rs
// ============================================================================
// Module: Response Envelopes
// Description: Typed decoding of response bodies after checks pass.
// Purpose: Extract context values without panicking on unexpected shapes.
// Dependencies: serde, serde_json, thiserror, flow-regtest-core
// ============================================================================

//! ## Overview
//! Phases only write context after the relevant checks passed. Decoding still
//! returns a [`DecodeError`] instead of assuming the shape, and the error is
//! recorded as a raised check through [`flow_regtest_core::Checker::require`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use flow_regtest_core::Exchange;
use flow_regtest_core::PredicateError;
use flow_regtest_core::TransportError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Top-level keys of every successful auth response.
pub const AUTH_ENVELOPE_KEYS: &[&str] = &["token", "user_id", "secret_id"];

/// Successful registration or login body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthEnvelope {
    /// Bearer token.
    pub token: String,
    /// Server-assigned user id.
    pub user_id: i64,
    /// Calendar secret id.
    pub secret_id: String,
}

/// User row returned by the GraphQL lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRow {
    /// User id.
    pub id: i64,
    /// Display name.
    pub full_name: String,
    /// Calendar secret id.
    pub secret_id: String,
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Failures while decoding a checked response.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No response arrived.
    #[error("no response: {0}")]
    NoResponse(#[from] TransportError),
    /// Body could not be read as JSON or the path is missing.
    #[error(transparent)]
    Body(#[from] PredicateError),
    /// Value at the path has an unexpected shape.
    #[error("unexpected shape at `{path}`: {message}")]
    Shape {
        /// Dotted path that was decoded.
        path: String,
        /// Deserializer message.
        message: String,
    },
}

/// Decodes the value at dotted `path` (empty for the whole body) into `T`.
///
/// # Errors
///
/// Returns [`DecodeError`] when no response arrived, the body is not JSON,
/// the path is missing, or the value does not deserialize into `T`.
pub fn decode<T: DeserializeOwned>(exchange: &Exchange, path: &str) -> Result<T, DecodeError> {
    let response = exchange.as_ref().map_err(Clone::clone)?;
    let value = response
        .json_at(path)?
        .ok_or_else(|| PredicateError::MissingValue(path.to_string()))?;
    serde_json::from_value(value).map_err(|err| DecodeError::Shape {
        path: path.to_string(),
        message: err.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
