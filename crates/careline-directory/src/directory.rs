//! The in-memory identity directory.
//!
//! Stands in for the hosted identity platform: it keeps accounts in a
//! map, checks credentials against salted digests, applies the password
//! policy and a failed-attempt rate limit, and publishes every session
//! change on a watch channel — the same observable behavior the session
//! layer sees from the real thing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use careline_identity::validate::email_is_valid;
use careline_identity::{Identity, Role, UserId};
use careline_session::{AmbientSession, ProfileUpdate, ProviderError};
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use uuid::Uuid;

use careline_session::IdentityProvider;

// ---------------------------------------------------------------------------
// DirectoryConfig
// ---------------------------------------------------------------------------

/// Policy knobs for the directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Minimum password length accepted at account creation.
    ///
    /// Default: 8.
    pub min_password_len: usize,

    /// How many wrong-password failures are tolerated per account within
    /// [`attempt_window`](Self::attempt_window) before sign-in is locked
    /// out with `TooManyAttempts`.
    ///
    /// Default: 5.
    pub max_failed_attempts: u32,

    /// The lockout window, measured from the first failure. Once it
    /// elapses the counter resets. Set to zero to disable lockout
    /// entirely (every window is instantly expired).
    ///
    /// Default: 60 seconds.
    pub attempt_window: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            min_password_len: 8,
            max_failed_attempts: 5,
            attempt_window: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// One stored account. The password is kept as a salted SHA-256 digest —
/// even the in-memory stand-in never holds plaintext past the call
/// boundary.
struct Account {
    id: UserId,
    email: String,
    display_name: String,
    role: Role,
    salt: [u8; 16],
    digest: [u8; 32],
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Wrong-password failures for one account. `window_start` is the first
/// failure of the current window.
struct FailedAttempts {
    count: u32,
    window_start: Instant,
}

#[derive(Default)]
struct DirectoryState {
    /// Accounts keyed by normalized (trimmed, lowercased) email.
    accounts: HashMap<String, Account>,
    /// Normalized email of the signed-in account, if any.
    signed_in: Option<String>,
    attempts: HashMap<String, FailedAttempts>,
}

// ---------------------------------------------------------------------------
// MemoryDirectory
// ---------------------------------------------------------------------------

/// An in-memory [`IdentityProvider`].
///
/// The ambient session starts [`AmbientSession::Resolving`] — the state
/// of a freshly launched app that hasn't checked for stored credentials
/// yet. The embedding application calls [`resolve_ambient`] once that
/// check is done (immediately, for the in-memory case).
///
/// # Concurrency note
///
/// Interior state sits behind a `std::sync::Mutex`; every trait method
/// completes its locking synchronously and never holds the lock across
/// an await point, so the async trait surface stays contention-free.
///
/// [`resolve_ambient`]: Self::resolve_ambient
pub struct MemoryDirectory {
    config: DirectoryConfig,
    inner: std::sync::Mutex<DirectoryState>,
    ambient: watch::Sender<AmbientSession>,
}

impl MemoryDirectory {
    /// Creates an empty directory with the default policy.
    pub fn new() -> Self {
        Self::with_config(DirectoryConfig::default())
    }

    pub fn with_config(config: DirectoryConfig) -> Self {
        let (ambient, _) = watch::channel(AmbientSession::Resolving);
        Self {
            config,
            inner: std::sync::Mutex::new(DirectoryState::default()),
            ambient,
        }
    }

    /// Inserts an account directly, bypassing policy checks — the
    /// equivalent of an account that already exists on the platform.
    /// Does not sign the account in and publishes nothing.
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Identity {
        let normalized = normalize(email);
        let salt = new_salt();
        let account = Account {
            id: UserId(Uuid::new_v4().to_string()),
            email: normalized.clone(),
            display_name: display_name.to_owned(),
            role,
            salt,
            digest: digest_password(&salt, password),
        };
        let identity = account.identity();
        self.inner
            .lock()
            .expect("directory lock")
            .accounts
            .insert(normalized, account);
        identity
    }

    /// Marks a seeded account's session as restorable, as if credentials
    /// had been stored on the device. Takes effect when
    /// [`resolve_ambient`](Self::resolve_ambient) runs. Returns `false`
    /// if no such account exists.
    pub fn restore_session(&self, email: &str) -> bool {
        let normalized = normalize(email);
        let mut state = self.inner.lock().expect("directory lock");
        if state.accounts.contains_key(&normalized) {
            state.signed_in = Some(normalized);
            true
        } else {
            false
        }
    }

    /// Resolves the ambient session: publishes `SignedIn` for a restored
    /// session, `SignedOut` otherwise.
    pub fn resolve_ambient(&self) {
        let ambient = {
            let state = self.inner.lock().expect("directory lock");
            match state.signed_in_identity() {
                Some(identity) => AmbientSession::SignedIn(identity),
                None => AmbientSession::SignedOut,
            }
        };
        tracing::debug!("ambient session resolved");
        self.ambient.send_replace(ambient);
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryState {
    fn signed_in_identity(&self) -> Option<Identity> {
        self.signed_in
            .as_ref()
            .and_then(|email| self.accounts.get(email))
            .map(Account::identity)
    }
}

impl IdentityProvider for MemoryDirectory {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        let normalized = normalize(email);
        if !email_is_valid(&normalized) {
            return Err(ProviderError::InvalidEmail);
        }
        if password.chars().count() < self.config.min_password_len {
            return Err(ProviderError::WeakPassword);
        }

        let identity = {
            let mut state = self.inner.lock().expect("directory lock");
            if state.accounts.contains_key(&normalized) {
                return Err(ProviderError::EmailInUse);
            }
            let salt = new_salt();
            let account = Account {
                id: UserId(Uuid::new_v4().to_string()),
                email: normalized.clone(),
                display_name: String::new(),
                role: Role::Unknown,
                salt,
                digest: digest_password(&salt, password),
            };
            let identity = account.identity();
            state.accounts.insert(normalized.clone(), account);
            // A new account is signed in immediately.
            state.signed_in = Some(normalized);
            identity
        };

        tracing::info!(user = %identity.id, "identity created");
        self.ambient
            .send_replace(AmbientSession::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        let normalized = normalize(email);
        if !email_is_valid(&normalized) {
            return Err(ProviderError::InvalidEmail);
        }

        let identity = {
            let mut state = self.inner.lock().expect("directory lock");

            // An expired window forgets past failures.
            let window_expired = match state.attempts.get(&normalized) {
                Some(attempts)
                    if attempts.window_start.elapsed()
                        > self.config.attempt_window =>
                {
                    true
                }
                Some(attempts)
                    if attempts.count >= self.config.max_failed_attempts =>
                {
                    return Err(ProviderError::TooManyAttempts);
                }
                _ => false,
            };
            if window_expired {
                state.attempts.remove(&normalized);
            }

            let account = state
                .accounts
                .get(&normalized)
                .ok_or(ProviderError::NotFound)?;

            if digest_password(&account.salt, password) != account.digest {
                let now = Instant::now();
                state
                    .attempts
                    .entry(normalized.clone())
                    .and_modify(|a| a.count += 1)
                    .or_insert(FailedAttempts {
                        count: 1,
                        window_start: now,
                    });
                return Err(ProviderError::WrongPassword);
            }

            state.attempts.remove(&normalized);
            let identity = state.accounts[&normalized].identity();
            state.signed_in = Some(normalized);
            identity
        };

        tracing::info!(user = %identity.id, "credentials verified");
        self.ambient
            .send_replace(AmbientSession::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn terminate_session(&self) -> Result<(), ProviderError> {
        self.inner.lock().expect("directory lock").signed_in = None;
        tracing::info!("session terminated");
        self.ambient.send_replace(AmbientSession::SignedOut);
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<(), ProviderError> {
        let published = {
            let mut state = self.inner.lock().expect("directory lock");
            let account = state
                .accounts
                .values_mut()
                .find(|account| &account.id == id)
                .ok_or(ProviderError::NotFound)?;

            if let Some(name) = update.display_name {
                account.display_name = name;
            }
            if let Some(role) = update.role {
                account.role = role;
            }
            let updated = account.identity();

            // Only the signed-in account's changes are session changes.
            state
                .signed_in_identity()
                .filter(|identity| &identity.id == id)
                .map(|_| updated)
        };

        if let Some(identity) = published {
            tracing::debug!(user = %identity.id, role = %identity.role, "profile updated");
            self.ambient
                .send_replace(AmbientSession::SignedIn(identity));
        }
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<AmbientSession> {
        self.ambient.subscribe()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_salt() -> [u8; 16] {
    rand::rng().random()
}

fn digest_password(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

// =========================================================================
// Tests
// =========================================================================
