//! Core identity types: who a user is and what role they hold.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// A unique, opaque identifier for an account.
///
/// This is a newtype wrapper around `String` rather than a bare string:
/// you can't accidentally pass an email (also a string) where an account
/// id is expected, and function signatures like
/// `fn submit(applicant: &UserId)` say what they mean.
///
/// The inner value is whatever the identity provider issues — a UUID for
/// the in-memory directory, a platform-specific uid in production. The
/// session layer never parses it, only compares and forwards it.
///
/// `#[serde(transparent)]` serializes the id as a plain JSON string, not
/// as `{ "0": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role an account holds on the platform.
///
/// Careline connects three kinds of users:
///
/// - **Client** — finds and books therapy sessions.
/// - **Therapist** — offers services and manages clients.
/// - **Partner** — a business that partners with the platform to fill
///   therapist shifts.
///
/// Role is first-class structured data stored on the identity record and
/// written through the provider's profile update, never inferred from the
/// display name or any other field.
///
/// `Unknown` covers accounts created before a role was assigned (a fresh
/// identity exists for a moment before its profile is written) and any
/// unrecognized value coming back from a newer backend. It is the serde
/// default so decoding a record without a role still succeeds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Therapist,
    Partner,
    #[default]
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Therapist => write!(f, "therapist"),
            Self::Partner => write!(f, "partner"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The authenticated user as the client application sees them.
///
/// An `Identity` is always fully populated — the session layer either
/// holds a complete one or none at all, never a partial record. It is a
/// *cache* of what the identity provider says; the provider's change
/// notifications are the only thing that writes it into session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The provider-issued account id.
    pub id: UserId,

    /// Human-readable name shown in the UI ("Avery Quinn").
    pub display_name: String,

    /// The email the account was registered with.
    pub email: String,

    /// The account's role, routing users to the right home screen.
    /// `#[serde(default)]` keeps records written before roles were
    /// structured data decodable (they fall back to [`Role::Unknown`]).
    #[serde(default)]
    pub role: Role,
}

// ---------------------------------------------------------------------------
// SignUpProfile
// ---------------------------------------------------------------------------

/// What the sign-up form collects before an account is created.
///
/// `birthdate` stays in the form's `MM/DD/YYYY` text format — the
/// [`validate`](crate::validate) module is responsible for parsing it and
/// enforcing the minimum-age rule before this profile reaches the session
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignUpProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Birthdate as entered, `MM/DD/YYYY`.
    pub birthdate: String,
    /// The role the new account should hold. Defaults to [`Role::Unknown`];
    /// the client-account path forces this to [`Role::Client`].
    #[serde(default)]
    pub role: Role,
}

impl SignUpProfile {
    /// The display name written to the new account's profile.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

// =========================================================================
// Tests
// =========================================================================
