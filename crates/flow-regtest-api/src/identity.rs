// crates/flow-regtest-api/src/identity.rs
// ============================================================================
// Module: Generated Identities
// Description: Run-unique account inputs and request bodies.
// Purpose: Keep concurrent virtual users and repeated runs from colliding.
// Dependencies: serde_json, flow-regtest-core
// ============================================================================

//! ## Overview
//! Every generated email and password embeds the virtual-user tag
//! `{number}.{iteration}.{nonce}`. Two virtual users never share an email,
//! and a rerun against the same backing store never collides with rows an
//! earlier run left behind.

use flow_regtest_core::EmailIdentity;
use flow_regtest_core::PersonName;
use flow_regtest_core::VirtualUser;
use serde_json::Value;
use serde_json::json;

use crate::envelope::AuthEnvelope;

/// Email accepted by every server validation but never registered.
pub const UNREGISTERED_EMAIL: &str = "not an email";

/// Password that passes validation but matches no account.
pub const WRONG_PASSWORD: &str = "not the password";

/// Password below the server minimum.
pub const SHORT_PASSWORD: &str = "pass";

/// Email below the server minimum.
pub const SHORT_EMAIL: &str = "@a.b";

/// Account inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    /// Run-unique email.
    pub email: String,
    /// Display name.
    pub name: PersonName,
    /// Run-unique password.
    pub password: String,
}

impl TestUser {
    /// Generates the inputs for `virtual_user`.
    #[must_use]
    pub fn for_run(virtual_user: &VirtualUser) -> Self {
        let tag = virtual_user.tag();
        Self {
            email: format!("test+{tag}@test.test"),
            name: PersonName {
                first: "Test".to_string(),
                last: format!("User {}", virtual_user.number),
            },
            password: format!("password-{tag}"),
        }
    }

    /// Body for `POST /auth/email/register`.
    #[must_use]
    pub fn registration_body(&self) -> Value {
        registration_body(&self.email, &self.name.full(), &self.password)
    }

    /// Body for `POST /auth/email/login`.
    #[must_use]
    pub fn login_body(&self) -> Value {
        login_body(&self.email, &self.password)
    }

    /// Combines the inputs with a successful registration envelope.
    #[must_use]
    pub fn into_identity(self, envelope: AuthEnvelope) -> EmailIdentity {
        EmailIdentity {
            email: self.email,
            name: self.name,
            password: self.password,
            user_id: envelope.user_id,
            secret_id: envelope.secret_id,
            token: envelope.token,
        }
    }
}

/// Builds a registration body from raw fields.
#[must_use]
pub fn registration_body(email: &str, name: &str, password: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": password,
    })
}

/// Builds a login body from raw fields.
#[must_use]
pub fn login_body(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
    })
}
