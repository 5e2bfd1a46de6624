// crates/flow-regtest-core/src/virtual_user.rs
// ============================================================================
// Module: Virtual User Identity
// Description: Run nonce and per-run virtual user identity.
// Purpose: Namespace generated input so concurrent runs never collide.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Every run executes as one virtual user on one iteration. Generated input
//! (emails, names, passwords) is namespaced by [`VirtualUser::tag`], which
//! combines the user number, the iteration, and a process-scoped
//! [`RunNonce`] drawn from the OS RNG. Two processes against the same backing
//! store therefore never register the same email.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write;

use rand::RngCore;
use rand::rngs::OsRng;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Number of random bytes in a generated nonce.
const NONCE_BYTES: usize = 8;

/// Process-scoped random token shared by every virtual user of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunNonce(String);

impl RunNonce {
    /// Generates a fresh hex nonce from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let mut encoded = String::with_capacity(NONCE_BYTES * 2);
        for byte in bytes {
            let _ = write!(encoded, "{byte:02x}");
        }
        Self(encoded)
    }

    /// Wraps a fixed nonce, for reproducible runs and tests.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the nonce text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one run: virtual user number, iteration, and run nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualUser {
    /// One-based virtual user number.
    pub number: u32,
    /// Zero-based iteration for this virtual user.
    pub iteration: u32,
    /// Nonce shared by the whole process.
    pub nonce: RunNonce,
}

impl VirtualUser {
    /// Creates a virtual user identity.
    #[must_use]
    pub const fn new(number: u32, iteration: u32, nonce: RunNonce) -> Self {
        Self {
            number,
            iteration,
            nonce,
        }
    }

    /// Returns the namespace tag `{number}.{iteration}.{nonce}`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}.{}.{}", self.number, self.iteration, self.nonce)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
