// crates/flow-regtest-core/src/keys.rs
// ============================================================================
// Module: Structural Key Checker
// Description: Exact field-set comparison for response envelopes.
// Purpose: Reject envelopes that gain or lose fields.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Envelope shape is asserted as set equality between the object's field
//! names and the expected names. Order does not matter and repeated expected
//! names collapse. Anything that is not an object fails without panicking.

use std::collections::BTreeSet;

use serde_json::Value;

/// Returns true iff `value` is an object whose key set equals `expected`.
#[must_use]
pub fn keys_are_exactly(value: Option<&Value>, expected: &[&str]) -> bool {
    let Some(Value::Object(map)) = value else {
        return false;
    };
    let expected: BTreeSet<&str> = expected.iter().copied().collect();
    map.len() == expected.len() && map.keys().all(|key| expected.contains(key.as_str()))
}
