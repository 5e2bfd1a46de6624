// crates/flow-regtest-core/src/context.rs
// ============================================================================
// Module: Run Context
// Description: Typed record threaded through the phases of one run.
// Purpose: Carry facts from earlier phases to later ones under ownership rules.
// Dependencies: serde, thiserror, crate::{phase, virtual_user}
// ============================================================================

//! ## Overview
//! A [`RunContext`] is created empty for each virtual-user run and passed by
//! `&mut` to every phase in order. It holds three sub-records, each written at
//! most once by the phase that produces it.
//!
//! While a phase is active, every read and write is checked against the
//! phase's declared [`PhaseContract`]: reading a field the phase did not
//! declare, or writing a field it does not produce, is a [`ContextError`].
//! Outside any phase (tests, the orchestrator itself) access is unrestricted,
//! but second writes are still rejected.
//!
//! Login is allowed to refine the session (`token`, `secret_id`) of the email
//! identity through [`RunContext::refine_email_session`]; the user id recorded
//! at registration never changes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::phase::PhaseContract;
use crate::virtual_user::VirtualUser;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Named sub-record of the run context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextField {
    /// Identity created by email registration.
    EmailIdentity,
    /// Identity created by third-party login.
    ThirdPartyIdentity,
    /// User record read back through GraphQL.
    LookedUpUser,
}

impl ContextField {
    /// Returns a stable label for the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailIdentity => "email_identity",
            Self::ThirdPartyIdentity => "third_party_identity",
            Self::LookedUpUser => "looked_up_user",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhaseId(&'static str);

impl PhaseId {
    /// Owner recorded for writes made outside any phase.
    pub const UNSCOPED: Self = Self("unscoped");

    /// Creates a phase identifier.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the identifier text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Display name of a generated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    /// Given name.
    pub first: String,
    /// Family name.
    pub last: String,
}

impl PersonName {
    /// Returns `first last`.
    #[must_use]
    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

/// Identity recorded by email registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailIdentity {
    /// Registered email.
    pub email: String,
    /// Registered name.
    pub name: PersonName,
    /// Registered password.
    pub password: String,
    /// Server-assigned user id; immutable once recorded.
    pub user_id: i64,
    /// Calendar secret id from the latest session.
    pub secret_id: String,
    /// Bearer token from the latest session.
    pub token: String,
}

/// Session fields a later login may replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRefinement {
    /// New bearer token.
    pub token: String,
    /// Secret id returned with the new session.
    pub secret_id: String,
}

/// Identity recorded by third-party login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdPartyIdentity {
    /// Bearer token.
    pub token: String,
    /// Server-assigned user id.
    pub user_id: i64,
    /// Calendar secret id.
    pub secret_id: String,
}

/// User row read back through GraphQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// User id.
    pub id: i64,
    /// Full display name.
    pub full_name: String,
    /// Calendar secret id.
    pub secret_id: String,
}

/// Where the calendar phase obtains the secret id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarSecretSource {
    /// The auth envelope from registration or login.
    #[default]
    Envelope,
    /// The record returned by the GraphQL lookup.
    Lookup,
}

impl CalendarSecretSource {
    /// Returns the context field the source reads.
    #[must_use]
    pub const fn field(self) -> ContextField {
        match self {
            Self::Envelope => ContextField::EmailIdentity,
            Self::Lookup => ContextField::LookedUpUser,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Context access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The field has not been recorded, usually because its producer failed.
    #[error("context field `{0}` has not been recorded")]
    Missing(ContextField),
    /// The field was already written.
    #[error("context field `{field}` was already written by `{owner}`")]
    AlreadyWritten {
        /// Field that was written twice.
        field: ContextField,
        /// Phase that made the first write.
        owner: PhaseId,
    },
    /// The active phase did not declare this access.
    #[error("phase `{phase}` did not declare access to `{field}`")]
    Undeclared {
        /// Active phase.
        phase: PhaseId,
        /// Field accessed.
        field: ContextField,
    },
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Value tagged with the phase that wrote it.
#[derive(Debug, Clone)]
struct Owned<T> {
    /// Stored value.
    value: T,
    /// Writing phase.
    owner: PhaseId,
}

/// Kind of access being checked against the active contract.
#[derive(Debug, Clone, Copy)]
enum Access {
    /// Reading a field.
    Read,
    /// First write of a field.
    Produce,
    /// In-place session refinement.
    Refine,
}

/// Mutable record shared by the phases of one run.
#[derive(Debug)]
pub struct RunContext {
    /// Identity of the run.
    virtual_user: VirtualUser,
    /// Email identity, once registered.
    email: Option<Owned<EmailIdentity>>,
    /// Third-party identity, once logged in.
    third_party: Option<Owned<ThirdPartyIdentity>>,
    /// GraphQL lookup result.
    looked_up_user: Option<Owned<UserRecord>>,
    /// Phase currently running and its contract.
    active: Option<(PhaseId, PhaseContract)>,
}

impl RunContext {
    /// Creates an empty context for one run.
    #[must_use]
    pub const fn new(virtual_user: VirtualUser) -> Self {
        Self {
            virtual_user,
            email: None,
            third_party: None,
            looked_up_user: None,
            active: None,
        }
    }

    /// Returns the run identity.
    #[must_use]
    pub const fn virtual_user(&self) -> &VirtualUser {
        &self.virtual_user
    }

    /// Marks a phase as active; subsequent access is checked against `contract`.
    pub fn enter_phase(&mut self, phase: PhaseId, contract: PhaseContract) {
        self.active = Some((phase, contract));
    }

    /// Clears the active phase.
    pub fn leave_phase(&mut self) {
        self.active = None;
    }

    /// Returns the fields recorded so far.
    #[must_use]
    pub fn fields(&self) -> Vec<ContextField> {
        let mut fields = Vec::new();
        if self.email.is_some() {
            fields.push(ContextField::EmailIdentity);
        }
        if self.third_party.is_some() {
            fields.push(ContextField::ThirdPartyIdentity);
        }
        if self.looked_up_user.is_some() {
            fields.push(ContextField::LookedUpUser);
        }
        fields
    }

    /// Returns the email identity.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the field is missing or undeclared.
    pub fn email(&self) -> Result<&EmailIdentity, ContextError> {
        self.authorize(ContextField::EmailIdentity, Access::Read)?;
        read(self.email.as_ref(), ContextField::EmailIdentity)
    }

    /// Records the email identity.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when already written or undeclared.
    pub fn record_email(&mut self, identity: EmailIdentity) -> Result<(), ContextError> {
        let owner = self.authorize(ContextField::EmailIdentity, Access::Produce)?;
        write(&mut self.email, identity, ContextField::EmailIdentity, owner)
    }

    /// Replaces the session token and secret id of the email identity.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the identity is missing or the phase did
    /// not declare the refinement.
    pub fn refine_email_session(
        &mut self,
        refinement: SessionRefinement,
    ) -> Result<(), ContextError> {
        self.authorize(ContextField::EmailIdentity, Access::Refine)?;
        let Some(owned) = self.email.as_mut() else {
            return Err(ContextError::Missing(ContextField::EmailIdentity));
        };
        owned.value.token = refinement.token;
        owned.value.secret_id = refinement.secret_id;
        Ok(())
    }

    /// Returns the third-party identity.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the field is missing or undeclared.
    pub fn third_party(&self) -> Result<&ThirdPartyIdentity, ContextError> {
        self.authorize(ContextField::ThirdPartyIdentity, Access::Read)?;
        read(self.third_party.as_ref(), ContextField::ThirdPartyIdentity)
    }

    /// Records the third-party identity.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when already written or undeclared.
    pub fn record_third_party(&mut self, identity: ThirdPartyIdentity) -> Result<(), ContextError> {
        let owner = self.authorize(ContextField::ThirdPartyIdentity, Access::Produce)?;
        write(&mut self.third_party, identity, ContextField::ThirdPartyIdentity, owner)
    }

    /// Returns the looked-up user record.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the field is missing or undeclared.
    pub fn looked_up_user(&self) -> Result<&UserRecord, ContextError> {
        self.authorize(ContextField::LookedUpUser, Access::Read)?;
        read(self.looked_up_user.as_ref(), ContextField::LookedUpUser)
    }

    /// Records the looked-up user record.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when already written or undeclared.
    pub fn record_looked_up_user(&mut self, record: UserRecord) -> Result<(), ContextError> {
        let owner = self.authorize(ContextField::LookedUpUser, Access::Produce)?;
        write(&mut self.looked_up_user, record, ContextField::LookedUpUser, owner)
    }

    /// Resolves the calendar secret id from the configured source.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the source record is missing or undeclared.
    pub fn calendar_secret(&self, source: CalendarSecretSource) -> Result<&str, ContextError> {
        match source {
            CalendarSecretSource::Envelope => Ok(self.email()?.secret_id.as_str()),
            CalendarSecretSource::Lookup => Ok(self.looked_up_user()?.secret_id.as_str()),
        }
    }

    /// Checks `field` against the active contract, returning the owner to record.
    fn authorize(&self, field: ContextField, access: Access) -> Result<PhaseId, ContextError> {
        let Some((phase, contract)) = &self.active else {
            return Ok(PhaseId::UNSCOPED);
        };
        let declared = match access {
            Access::Read => {
                contract.requires.contains(&field)
                    || contract.produces.contains(&field)
                    || contract.refines.contains(&field)
            }
            Access::Produce => contract.produces.contains(&field),
            Access::Refine => contract.refines.contains(&field),
        };
        if declared {
            Ok(*phase)
        } else {
            Err(ContextError::Undeclared {
                phase: *phase,
                field,
            })
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an owned slot.
fn read<T>(slot: Option<&Owned<T>>, field: ContextField) -> Result<&T, ContextError> {
    slot.map(|owned| &owned.value).ok_or(ContextError::Missing(field))
}

/// Writes an owned slot once.
fn write<T>(
    slot: &mut Option<Owned<T>>,
    value: T,
    field: ContextField,
    owner: PhaseId,
) -> Result<(), ContextError> {
    if let Some(existing) = slot {
        return Err(ContextError::AlreadyWritten {
            field,
            owner: existing.owner,
        });
    }
    *slot = Some(Owned {
        value,
        owner,
    });
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
