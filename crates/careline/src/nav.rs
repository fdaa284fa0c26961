//! The navigation gate: which screen does this session state belong on?
//!
//! The navigation layer itself (screen stacks, transitions) lives with
//! the UI. What lives here is the *decision* — a pure function from a
//! session snapshot to a route — so the one piece of navigation with
//! actual rules is testable without rendering anything.

use careline_identity::Role;
use careline_session::{SessionSnapshot, SessionState};

/// Where the navigation layer should put the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Authentication state isn't final yet — show the loading screen,
    /// don't commit to a destination.
    Loading,
    /// Nobody is signed in.
    SignIn,
    ClientHome,
    TherapistHome,
    PartnerHome,
}

/// Decides the route for a session snapshot.
///
/// While `loading` is true nothing else matters: the state may still
/// change, so the only safe destination is the loading screen. Once
/// settled, authenticated users route by role — with [`Role::Unknown`]
/// falling back to the client home, the least-privileged destination —
/// and everyone else goes to sign-in.
pub fn route_for(snapshot: &SessionSnapshot) -> Route {
    if snapshot.loading {
        return Route::Loading;
    }
    match &snapshot.state {
        SessionState::Initializing => Route::Loading,
        SessionState::Unauthenticated => Route::SignIn,
        SessionState::Authenticated(identity) => match identity.role {
            Role::Client | Role::Unknown => Route::ClientHome,
            Role::Therapist => Route::TherapistHome,
            Role::Partner => Route::PartnerHome,
        },
    }
}

// =========================================================================
// Tests
// =========================================================================
