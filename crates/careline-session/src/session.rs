//! Session state: the data structures that represent "who is signed in".
//!
//! A "session" here is the *client's* view of authentication, not a
//! server-side record. It tracks:
//! - WHO is signed in, if anyone (`Identity`)
//! - WHETHER that answer is final yet (`loading`)

use std::time::Duration;

use careline_identity::Identity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on any single identity-provider or application-store
    /// call, and on waiting for the resulting change notification.
    /// Expiry surfaces as [`AuthError::Timeout`](crate::AuthError::Timeout)
    /// instead of leaving the caller hanging.
    ///
    /// Default: 10 seconds.
    pub provider_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The authentication state machine.
///
/// ```text
///                ┌──(ambient: signed in)──→ Authenticated ──(sign_out)──┐
/// Initializing ──┤                            ↑       │ role application │
///                └──(ambient: signed out)─→ Unauthenticated ←────────────┘
///                                             │  sign_in / sign_up
///                                             └──────→ Authenticated
/// ```
///
/// - **Initializing**: process just started; the provider hasn't told us
///   yet whether an ambient session exists. No routing decision should be
///   made from this state.
/// - **Authenticated**: a fully populated [`Identity`] is present. A role
///   application moves `Authenticated(id)` to `Authenticated(id')` with
///   the new role.
/// - **Unauthenticated**: no user; the sign-in screen is the only place
///   to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the provider to resolve the ambient session.
    Initializing,

    /// A user is signed in.
    Authenticated(Identity),

    /// Nobody is signed in.
    Unauthenticated,
}

impl SessionState {
    /// Returns the signed-in identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Authenticated(identity) => {
                write!(f, "authenticated({})", identity.id)
            }
            Self::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// What consumers observe: the current state plus whether a transition is
/// still in flight.
///
/// While `loading` is true the state is **not final** — the initial
/// ambient resolution or an explicit operation is still running, and a
/// dependent view should show a spinner rather than routing on the
/// current value. Every operation exit path, success or failure, resets
/// `loading` to false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub loading: bool,
}

impl SessionSnapshot {
    /// The snapshot a manager starts from: nothing known, resolution
    /// pending.
    pub(crate) fn initial() -> Self {
        Self {
            state: SessionState::Initializing,
            loading: true,
        }
    }

    /// Shorthand for `self.state.identity()`.
    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }
}

// =========================================================================
// Tests
// =========================================================================
