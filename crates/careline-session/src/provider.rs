//! The identity-provider seam.
//!
//! Careline doesn't verify credentials itself — that's the job of an
//! external identity platform (a hosted auth service in production, the
//! in-memory directory in development and tests). This module defines the
//! [`IdentityProvider`] trait: the exact surface the session layer needs,
//! and nothing else.
//!
//! # The change stream
//!
//! Besides request/response calls, a provider exposes a *change stream*:
//! a [`tokio::sync::watch`] channel carrying the current
//! [`AmbientSession`]. The session manager subscribes exactly once at
//! construction and applies every value it sees; that stream — not the
//! return values of `verify_credentials` or `create_identity` — is what
//! actually moves identity into session state. Consumers of a watch
//! channel can always read the latest value synchronously and await the
//! next change, which is precisely the contract the session layer needs.

use careline_identity::{Identity, Role, UserId};
use tokio::sync::watch;

use crate::ProviderError;

// ---------------------------------------------------------------------------
// AmbientSession
// ---------------------------------------------------------------------------

/// What the provider currently knows about the session.
///
/// `Resolving` is the value at process start, before the provider has
/// checked for stored credentials. The session manager holds
/// `Initializing` until this resolves one way or the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbientSession {
    /// The provider hasn't determined the ambient session yet.
    Resolving,

    /// No session exists.
    SignedOut,

    /// A session exists for this identity. Re-published whenever the
    /// signed-in account's profile changes.
    SignedIn(Identity),
}

// ---------------------------------------------------------------------------
// ProfileUpdate
// ---------------------------------------------------------------------------

/// A partial profile write: only the populated fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

impl ProfileUpdate {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

// ---------------------------------------------------------------------------
// IdentityProvider
// ---------------------------------------------------------------------------

/// The external identity platform, as the session layer sees it.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared across async tasks behind an `Arc`.
/// - `'static` → lives as long as the session manager.
///
/// # Contract
///
/// Every mutating call that succeeds must also publish the resulting
/// [`AmbientSession`] on the change stream; the session manager relies on
/// that notification, not the return value, to update its state.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Creates an account and signs it in.
    ///
    /// # Errors
    /// [`ProviderError::InvalidEmail`], [`ProviderError::EmailInUse`],
    /// [`ProviderError::WeakPassword`], or
    /// [`ProviderError::Unavailable`].
    fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Identity, ProviderError>> + Send;

    /// Checks a credential pair and signs the account in on success.
    ///
    /// # Errors
    /// [`ProviderError::NotFound`], [`ProviderError::WrongPassword`],
    /// [`ProviderError::InvalidEmail`],
    /// [`ProviderError::TooManyAttempts`], or
    /// [`ProviderError::Unavailable`].
    fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Identity, ProviderError>> + Send;

    /// Ends the current session. Idempotent — terminating when no
    /// session exists is not an error.
    fn terminate_session(
        &self,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Writes the populated fields of `update` to the account's profile.
    ///
    /// # Errors
    /// [`ProviderError::NotFound`] if no account has this id.
    fn update_profile(
        &self,
        id: &UserId,
        update: ProfileUpdate,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Subscribes to the change stream. Each receiver sees the current
    /// value immediately and every change after it.
    fn changes(&self) -> watch::Receiver<AmbientSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_builders() {
        let update = ProfileUpdate::display_name("Avery Quinn")
            .with_role(Role::Therapist);
        assert_eq!(update.display_name.as_deref(), Some("Avery Quinn"));
        assert_eq!(update.role, Some(Role::Therapist));

        let role_only = ProfileUpdate::role(Role::Client);
        assert!(role_only.display_name.is_none());
        assert_eq!(role_only.role, Some(Role::Client));
    }
}
