//! Session management for Careline.
//!
//! This crate owns the client application's authentication state:
//!
//! 1. **The state machine** — [`SessionState`] moves between
//!    `Initializing`, `Authenticated`, and `Unauthenticated`; consumers
//!    observe it through [`SessionSnapshot`]s.
//! 2. **The operations** — sign-in, sign-up, sign-out, and the
//!    therapist/partner role applications ([`SessionManager`]).
//! 3. **The collaborator seams** — the [`IdentityProvider`] trait (whoever
//!    actually verifies credentials) and the [`ApplicationStore`] trait
//!    (wherever application payloads are persisted).
//!
//! # How it fits in the stack
//!
//! ```text
//! Screens / navigation (above)  ← subscribe to snapshots, route by role
//!     ↕
//! Session layer (this crate)    ← state machine + operations
//!     ↕
//! Identity provider (below)     ← credential checks, session lifecycle
//! ```
//!
//! # Single source of truth
//!
//! The provider's change-notification stream is the only thing that
//! writes the identity into session state. Operations trigger
//! provider-side work and then *wait for the notification to land*, so
//! the in-memory state can never disagree with the provider's
//! authoritative state — there is no optimistic local write to lose a
//! race against a newer authoritative one.

#![allow(async_fn_in_trait)]

mod error;
mod manager;
mod provider;
mod session;
mod store;

pub use error::{AuthError, ProviderError, StoreError};
pub use manager::SessionManager;
pub use provider::{AmbientSession, IdentityProvider, ProfileUpdate};
pub use session::{SessionConfig, SessionSnapshot, SessionState};
pub use store::{
    ApplicationId, ApplicationPayload, ApplicationRecord, ApplicationStore,
};
