// crates/flow-regtest-api/src/graphql.rs
// ============================================================================
// Module: GraphQL Operations
// Description: Query and mutation documents used against the user table.
// Purpose: Keep operation text and variable shapes in one place.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The GraphQL engine applies row-level permissions: a bearer token only sees
//! and deletes its own user row. [`UNRELATED_USER_ID`] names a row the caller
//! never owns, so queries against it must come back empty.

use serde_json::Value;
use serde_json::json;

/// A user id no run-generated account owns.
pub const UNRELATED_USER_ID: i64 = 42;

/// Fetches a user row by id.
pub const USER_BY_ID: &str = "query UserById($id: Int!) { user(where: {id: {_eq: $id}}) { id \
                              full_name secret_id } }";

/// Fetches user ids by email.
pub const USER_BY_EMAIL: &str =
    "query UserByEmail($email: String!) { user(where: {email: {_eq: $email}}) { id } }";

/// Deletes a user row by id.
pub const DELETE_USER: &str = "mutation DeleteUser($id: Int!) { delete_user(where: {id: {_eq: \
                               $id}}) { affected_rows } }";

/// Result path of the user queries.
pub const USER_ROWS: &str = "data.user";

/// First row of the user queries.
pub const FIRST_USER_ROW: &str = "data.user.0";

/// Result path of the delete mutation.
pub const AFFECTED_ROWS: &str = "data.delete_user.affected_rows";

/// Variables selecting one id.
#[must_use]
pub fn id_variables(id: i64) -> Value {
    json!({ "id": id })
}

/// Variables selecting one email.
#[must_use]
pub fn email_variables(email: &str) -> Value {
    json!({ "email": email })
}
