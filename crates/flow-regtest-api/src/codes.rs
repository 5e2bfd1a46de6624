// crates/flow-regtest-api/src/codes.rs
// ============================================================================
// Module: API Error Codes
// Description: Machine-readable error codes the Flow API returns.
// Purpose: Name every asserted code once and group accepted aliases.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Error responses carry `{"error": "<code>"}`. Some conditions are reported
//! under more than one code depending on the server revision, so checks
//! assert membership in a family rather than a single string.

// ============================================================================
// SECTION: Codes
// ============================================================================

/// Error codes asserted by the phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Generic validation failure.
    BadRequest,
    /// Database constraint rejected the input.
    ConstraintViolation,
    /// Password below the minimum length.
    PasswordTooShort,
    /// Email below the minimum length.
    EmailTooShort,
    /// Login for an email that was never registered.
    EmailNotRegistered,
    /// Login with the wrong password.
    EmailWrongPassword,
    /// Email already registered.
    EmailTaken,
    /// Email already registered through email signup.
    EmailTakenByEmail,
    /// Third-party login without a usable access token.
    FacebookAuthBadRequest,
}

impl ApiErrorCode {
    /// Returns the wire form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::ConstraintViolation => "constraint_violation",
            Self::PasswordTooShort => "password_too_short",
            Self::EmailTooShort => "email_too_short",
            Self::EmailNotRegistered => "email_not_registered",
            Self::EmailWrongPassword => "email_wrong_password",
            Self::EmailTaken => "email_taken",
            Self::EmailTakenByEmail => "email_taken_by_email",
            Self::FacebookAuthBadRequest => "facebook_auth_bad_request",
        }
    }
}

// ============================================================================
// SECTION: Families
// ============================================================================

/// Codes accepted for malformed registration input.
pub const BAD_REQUEST_FAMILY: &[&str] =
    &[ApiErrorCode::BadRequest.as_str(), ApiErrorCode::ConstraintViolation.as_str()];

/// Codes accepted for a duplicate registration.
pub const EMAIL_TAKEN_FAMILY: &[&str] =
    &[ApiErrorCode::EmailTakenByEmail.as_str(), ApiErrorCode::EmailTaken.as_str()];

/// Single-code family for a too-short password.
pub const PASSWORD_TOO_SHORT: &[&str] = &[ApiErrorCode::PasswordTooShort.as_str()];

/// Single-code family for a too-short email.
pub const EMAIL_TOO_SHORT: &[&str] = &[ApiErrorCode::EmailTooShort.as_str()];

/// Single-code family for an unknown email.
pub const EMAIL_NOT_REGISTERED: &[&str] = &[ApiErrorCode::EmailNotRegistered.as_str()];

/// Single-code family for a wrong password.
pub const EMAIL_WRONG_PASSWORD: &[&str] = &[ApiErrorCode::EmailWrongPassword.as_str()];

/// Single-code family for a missing third-party token.
pub const FACEBOOK_AUTH_BAD_REQUEST: &[&str] = &[ApiErrorCode::FacebookAuthBadRequest.as_str()];
