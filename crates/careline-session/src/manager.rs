//! The session manager: owns authentication state and its transitions.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Resolving the ambient session at startup
//! - Running the explicit operations (sign-in, sign-up, sign-out, role
//!   applications)
//! - Classifying provider failures into the caller-facing taxonomy
//! - Publishing every state change to subscribers
//!
//! # Concurrency note
//!
//! There is no shared-memory locking to reason about here. The provider's
//! change stream is the sole writer of the identity in the snapshot; the
//! explicit operations only trigger provider-side work, toggle the
//! loading flag, and wait for the resulting notification. Overlapping
//! mutating operations are rejected up front (one at a time), so two
//! operations can never interleave their writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use careline_identity::{
    ApplicationStatus, PartnerApplication, Role, SignUpProfile,
    TherapistApplication,
};
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    AmbientSession, ApplicationId, ApplicationPayload, ApplicationRecord,
    ApplicationStore, AuthError, IdentityProvider, ProfileUpdate,
    ProviderError, SessionConfig, SessionSnapshot, SessionState,
};

/// Owns the client's authentication state.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ [Initializing] ──(ambient resolves)──→ [Unauthenticated]
///                                                        │ sign_in / sign_up
///                                                        ▼
///              sign_out ←──────────────────────── [Authenticated]
///                 │                                      │ role application
///                 ▼                                      ▼
///          [Unauthenticated]                  [Authenticated, new role]
/// ```
///
/// One subscription to the provider's change stream is established at
/// construction and torn down exactly once when the manager is dropped.
pub struct SessionManager<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    config: SessionConfig,

    /// The published state. Consumers subscribe to this; the watcher task
    /// writes the identity part, operations toggle `loading`.
    snapshot_tx: watch::Sender<SessionSnapshot>,

    /// True while a mutating operation is in flight. Checked with a
    /// compare-and-swap so two operations can never both pass the gate.
    in_flight: Arc<AtomicBool>,

    /// The task applying provider change notifications. Aborted on drop —
    /// the paired "unsubscribe" for the construction-time subscribe.
    watcher: JoinHandle<()>,
}

impl<P, S> SessionManager<P, S>
where
    P: IdentityProvider,
    S: ApplicationStore,
{
    /// Creates a manager with the default [`SessionConfig`] and
    /// subscribes it to the provider's change stream.
    pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
        Self::with_config(provider, store, SessionConfig::default())
    }

    /// Creates a manager with an explicit config.
    pub fn with_config(
        provider: Arc<P>,
        store: Arc<S>,
        config: SessionConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial());
        let in_flight = Arc::new(AtomicBool::new(false));

        let mut changes = provider.changes();
        let tx = snapshot_tx.clone();
        let busy = Arc::clone(&in_flight);
        let watcher = tokio::spawn(async move {
            // Apply the value the provider holds right now (it may have
            // resolved before we subscribed), then every change after it.
            loop {
                let ambient = changes.borrow_and_update().clone();
                apply_ambient(&tx, &busy, ambient);
                if changes.changed().await.is_err() {
                    tracing::debug!("provider change stream closed");
                    break;
                }
            }
        });

        Self {
            provider,
            store,
            config,
            snapshot_tx,
            in_flight,
            watcher,
        }
    }

    // -- Observation ------------------------------------------------------

    /// The current snapshot. While `loading` is true the state is not
    /// final and shouldn't drive routing.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribes to state changes. The receiver sees the current
    /// snapshot immediately and every change after it.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // -- Operations -------------------------------------------------------

    /// Signs in with an email/password pair.
    ///
    /// Inputs are expected to be validated upstream (non-empty, email
    /// shape); this method forwards them to the provider as-is. On
    /// success the identity arrives through the change stream — this
    /// method waits for it to land before returning, so a successful
    /// return guarantees [`SessionState::Authenticated`].
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`], [`AuthError::RateLimited`],
    /// [`AuthError::Timeout`], [`AuthError::OperationInFlight`], or
    /// [`AuthError::Unknown`]. State is unchanged on failure.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let _guard = self.begin_operation()?;
        tracing::debug!(email, "sign-in requested");

        let identity = self
            .bounded(self.provider.verify_credentials(email, password))
            .await?;

        let expected = identity.id.clone();
        self.wait_for_snapshot(move |snapshot| {
            matches!(&snapshot.state, SessionState::Authenticated(id) if id.id == expected)
        })
        .await?;

        tracing::info!(user = %identity.id, role = %identity.role, "signed in");
        Ok(())
    }

    /// Creates an account from a sign-up profile, then writes the display
    /// name and role to the new account's profile.
    ///
    /// # Errors
    /// Fails fast with [`AuthError::InvalidEmailFormat`] when the email
    /// is blank, before any provider call. Otherwise
    /// [`AuthError::EmailAlreadyInUse`], [`AuthError::WeakPassword`],
    /// [`AuthError::InvalidEmailFormat`], [`AuthError::Timeout`],
    /// [`AuthError::OperationInFlight`], or [`AuthError::Unknown`].
    pub async fn sign_up(
        &self,
        profile: SignUpProfile,
        password: &str,
    ) -> Result<(), AuthError> {
        let _guard = self.begin_operation()?;

        if profile.email.trim().is_empty() {
            return Err(AuthError::InvalidEmailFormat);
        }
        tracing::debug!(email = %profile.email, role = %profile.role, "sign-up requested");

        let identity = self
            .bounded(self.provider.create_identity(&profile.email, password))
            .await?;

        let update = ProfileUpdate::display_name(profile.display_name())
            .with_role(profile.role);
        self.bounded(self.provider.update_profile(&identity.id, update))
            .await?;

        let expected = identity.id.clone();
        let role = profile.role;
        self.wait_for_snapshot(move |snapshot| {
            matches!(&snapshot.state, SessionState::Authenticated(id)
                if id.id == expected && id.role == role)
        })
        .await?;

        tracing::info!(user = %identity.id, role = %role, "account created");
        Ok(())
    }

    /// [`sign_up`](Self::sign_up) with the role forced to
    /// [`Role::Client`].
    pub async fn create_client_account(
        &self,
        mut profile: SignUpProfile,
        password: &str,
    ) -> Result<(), AuthError> {
        profile.role = Role::Client;
        self.sign_up(profile, password).await
    }

    /// Submits a therapist application.
    ///
    /// Reuses the signed-in identity when there is one; otherwise creates
    /// an account from the application's contact email and `password`.
    /// The payload is forwarded to the application store tagged
    /// `pending` with a submission timestamp, and the identity is then
    /// retagged with [`Role::Therapist`].
    ///
    /// # Errors
    /// [`AuthError::StoreUnavailable`] if the store can't take the
    /// submission — the identity's role is left unchanged in that case —
    /// plus the usual provider kinds.
    pub async fn create_therapist_application(
        &self,
        application: TherapistApplication,
        password: &str,
    ) -> Result<ApplicationId, AuthError> {
        let display_name = format!(
            "{} {}",
            application.first_name.trim(),
            application.last_name.trim()
        );
        let email = application.email.clone();
        self.submit_role_application(
            Role::Therapist,
            display_name,
            &email,
            password,
            ApplicationPayload::Therapist(application),
        )
        .await
    }

    /// Submits a partner-business application. Same contract as
    /// [`create_therapist_application`](Self::create_therapist_application),
    /// retagging with [`Role::Partner`].
    pub async fn create_partner_application(
        &self,
        application: PartnerApplication,
        password: &str,
    ) -> Result<ApplicationId, AuthError> {
        let display_name = format!(
            "{} {}",
            application.manager_first_name.trim(),
            application.manager_last_name.trim()
        );
        let email = application.email.clone();
        self.submit_role_application(
            Role::Partner,
            display_name,
            &email,
            password,
            ApplicationPayload::Partner(application),
        )
        .await
    }

    /// Signs out.
    ///
    /// Idempotent: when nobody is signed in this is a no-op returning
    /// `Ok`. Otherwise it requests session termination from the provider
    /// and waits for the signed-out notification — the identity is never
    /// cleared eagerly, so local state can't disagree with the provider.
    ///
    /// # Errors
    /// [`AuthError::Timeout`], [`AuthError::OperationInFlight`], or
    /// [`AuthError::Unknown`].
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if !self.snapshot_tx.borrow().state.is_authenticated() {
            return Ok(());
        }

        let _guard = self.begin_operation()?;
        tracing::debug!("sign-out requested");

        self.bounded(self.provider.terminate_session()).await?;
        self.wait_for_snapshot(|snapshot| {
            snapshot.state == SessionState::Unauthenticated
        })
        .await?;

        tracing::info!("signed out");
        Ok(())
    }

    // -- Internals --------------------------------------------------------

    /// Shared path for the two role applications.
    async fn submit_role_application(
        &self,
        role: Role,
        display_name: String,
        email: &str,
        password: &str,
        payload: ApplicationPayload,
    ) -> Result<ApplicationId, AuthError> {
        let _guard = self.begin_operation()?;
        tracing::debug!(%role, "role application requested");

        // Reuse the signed-in identity; the clone keeps the watch borrow
        // from being held across an await.
        let existing = self.snapshot_tx.borrow().identity().cloned();
        let (applicant, fresh_account) = match existing {
            Some(identity) => (identity, false),
            None => {
                if email.trim().is_empty() {
                    return Err(AuthError::InvalidEmailFormat);
                }
                let identity = self
                    .bounded(self.provider.create_identity(email, password))
                    .await?;
                (identity, true)
            }
        };

        // The store gets the payload before the role changes: an
        // application that was never persisted must not retag anyone.
        let record = ApplicationRecord {
            applicant: applicant.id.clone(),
            role,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            payload,
        };
        let application_id = match tokio::time::timeout(
            self.config.provider_timeout,
            self.store.submit_application(record),
        )
        .await
        {
            Ok(Ok(id)) => id,
            Ok(Err(err)) => {
                tracing::warn!(%role, error = %err, "application submission failed");
                return Err(err.into());
            }
            Err(_) => return Err(AuthError::Timeout),
        };

        let mut update = ProfileUpdate::role(role);
        if fresh_account {
            update.display_name = Some(display_name);
        }
        self.bounded(self.provider.update_profile(&applicant.id, update))
            .await?;

        let expected = applicant.id.clone();
        self.wait_for_snapshot(move |snapshot| {
            matches!(&snapshot.state, SessionState::Authenticated(id)
                if id.id == expected && id.role == role)
        })
        .await?;

        tracing::info!(
            user = %applicant.id,
            %role,
            application = %application_id,
            "application submitted"
        );
        Ok(application_id)
    }

    /// Gates a mutating operation: rejects if one is already in flight,
    /// otherwise raises the loading flag and returns a guard that lowers
    /// both on drop (any exit path, including panics).
    fn begin_operation(&self) -> Result<OperationGuard<'_>, AuthError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AuthError::OperationInFlight);
        }
        self.snapshot_tx
            .send_modify(|snapshot| snapshot.loading = true);
        Ok(OperationGuard {
            snapshot_tx: &self.snapshot_tx,
            in_flight: &self.in_flight,
        })
    }

    /// Runs a provider call under the configured timeout and classifies
    /// its failure codes.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.config.provider_timeout, call).await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "provider call failed");
                Err(err.into())
            }
            Err(_) => {
                tracing::warn!("provider call timed out");
                Err(AuthError::Timeout)
            }
        }
    }

    /// Waits (bounded) until the published snapshot satisfies `pred` —
    /// i.e. until the provider's change notification has landed.
    async fn wait_for_snapshot(
        &self,
        mut pred: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<(), AuthError> {
        let mut rx = self.snapshot_tx.subscribe();
        match tokio::time::timeout(
            self.config.provider_timeout,
            rx.wait_for(|snapshot| pred(snapshot)),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            // The sender lives on `self`, so the channel can only close
            // if the manager itself is going away mid-call.
            Ok(Err(_)) => {
                Err(AuthError::Unknown("session state channel closed".into()))
            }
            Err(_) => {
                tracing::warn!("change notification did not arrive in time");
                Err(AuthError::Timeout)
            }
        }
    }
}

impl<P, S> Drop for SessionManager<P, S> {
    fn drop(&mut self) {
        // Tear down the provider subscription exactly once.
        self.watcher.abort();
    }
}

/// Applies one ambient-session value to the published snapshot.
///
/// The loading flag is only lowered when no explicit operation is in
/// flight: during an operation, its guard owns the flag and lowers it
/// when the operation finishes.
fn apply_ambient(
    tx: &watch::Sender<SessionSnapshot>,
    in_flight: &AtomicBool,
    ambient: AmbientSession,
) {
    let resolved = !matches!(ambient, AmbientSession::Resolving);
    tx.send_modify(|snapshot| {
        snapshot.state = match ambient {
            AmbientSession::Resolving => SessionState::Initializing,
            AmbientSession::SignedOut => SessionState::Unauthenticated,
            AmbientSession::SignedIn(identity) => {
                SessionState::Authenticated(identity)
            }
        };
        if resolved && !in_flight.load(Ordering::Acquire) {
            snapshot.loading = false;
        }
    });
    tracing::debug!(state = %tx.borrow().state, "session state applied");
}

/// Lowers the loading and in-flight flags when an operation exits.
struct OperationGuard<'a> {
    snapshot_tx: &'a watch::Sender<SessionSnapshot>,
    in_flight: &'a AtomicBool,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.snapshot_tx
            .send_modify(|snapshot| snapshot.loading = false);
        self.in_flight.store(false, Ordering::Release);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager` against a scripted provider.
    //!
    //! The provider here is deliberately tiny: a map of identities, a
    //! one-shot failure slot, and a "hang" switch for timeout tests.
    //! Realistic end-to-end flows run against the in-memory directory in
    //! the `careline` integration suite.
    //!
    //! Timeout tests use `#[tokio::test(start_paused = true)]` so the
    //! clock auto-advances instead of sleeping for real.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use careline_identity::{Identity, TherapyType, UserId};

    use super::*;
    use crate::StoreError;

    // -- Scripted provider ------------------------------------------------

    struct TestProvider {
        tx: watch::Sender<AmbientSession>,
        identities: Mutex<HashMap<String, Identity>>,
        /// Next `verify_credentials` call fails with this code.
        fail_verify: Mutex<Option<ProviderError>>,
        /// When set, every call pends forever.
        hang: AtomicBool,
    }

    impl TestProvider {
        /// A provider whose ambient session is already resolved to
        /// signed-out.
        fn resolved() -> Arc<Self> {
            let (tx, _) = watch::channel(AmbientSession::SignedOut);
            Arc::new(Self {
                tx,
                identities: Mutex::new(HashMap::new()),
                fail_verify: Mutex::new(None),
                hang: AtomicBool::new(false),
            })
        }

        /// A provider still resolving its ambient session.
        fn resolving() -> Arc<Self> {
            let provider = Self::resolved();
            provider.tx.send_replace(AmbientSession::Resolving);
            provider
        }

        fn with_account(self: Arc<Self>, email: &str, role: Role) -> Arc<Self> {
            let identity = Identity {
                id: UserId(format!("id-{email}")),
                display_name: "Test User".into(),
                email: email.into(),
                role,
            };
            self.identities
                .lock()
                .unwrap()
                .insert(email.into(), identity);
            self
        }

        fn fail_next_verify(&self, err: ProviderError) {
            *self.fail_verify.lock().unwrap() = Some(err);
        }

        async fn maybe_hang(&self) {
            if self.hang.load(Ordering::Acquire) {
                std::future::pending::<()>().await;
            }
        }
    }

    impl IdentityProvider for TestProvider {
        async fn create_identity(
            &self,
            email: &str,
            password: &str,
        ) -> Result<Identity, ProviderError> {
            self.maybe_hang().await;
            let _ = password;
            let mut identities = self.identities.lock().unwrap();
            if identities.contains_key(email) {
                return Err(ProviderError::EmailInUse);
            }
            let identity = Identity {
                id: UserId(format!("id-{email}")),
                display_name: String::new(),
                email: email.into(),
                role: Role::Unknown,
            };
            identities.insert(email.into(), identity.clone());
            drop(identities);
            self.tx
                .send_replace(AmbientSession::SignedIn(identity.clone()));
            Ok(identity)
        }

        async fn verify_credentials(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<Identity, ProviderError> {
            self.maybe_hang().await;
            if let Some(err) = self.fail_verify.lock().unwrap().take() {
                return Err(err);
            }
            let identity = self
                .identities
                .lock()
                .unwrap()
                .get(email)
                .cloned()
                .ok_or(ProviderError::NotFound)?;
            self.tx
                .send_replace(AmbientSession::SignedIn(identity.clone()));
            Ok(identity)
        }

        async fn terminate_session(&self) -> Result<(), ProviderError> {
            self.maybe_hang().await;
            self.tx.send_replace(AmbientSession::SignedOut);
            Ok(())
        }

        async fn update_profile(
            &self,
            id: &UserId,
            update: ProfileUpdate,
        ) -> Result<(), ProviderError> {
            self.maybe_hang().await;
            let mut identities = self.identities.lock().unwrap();
            let identity = identities
                .values_mut()
                .find(|i| &i.id == id)
                .ok_or(ProviderError::NotFound)?;
            if let Some(name) = update.display_name {
                identity.display_name = name;
            }
            if let Some(role) = update.role {
                identity.role = role;
            }
            let updated = identity.clone();
            drop(identities);
            self.tx.send_replace(AmbientSession::SignedIn(updated));
            Ok(())
        }

        fn changes(&self) -> watch::Receiver<AmbientSession> {
            self.tx.subscribe()
        }
    }

    // -- Scripted store ---------------------------------------------------

    #[derive(Default)]
    struct TestStore {
        offline: AtomicBool,
        records: Mutex<Vec<ApplicationRecord>>,
    }

    impl ApplicationStore for TestStore {
        async fn submit_application(
            &self,
            record: ApplicationRecord,
        ) -> Result<ApplicationId, StoreError> {
            if self.offline.load(Ordering::Acquire) {
                return Err(StoreError::Unavailable("offline".into()));
            }
            self.records.lock().unwrap().push(record);
            Ok(ApplicationId::new())
        }
    }

    // -- Helpers ----------------------------------------------------------

    fn manager(
        provider: Arc<TestProvider>,
    ) -> (SessionManager<TestProvider, TestStore>, Arc<TestStore>) {
        let store = Arc::new(TestStore::default());
        (
            SessionManager::new(provider, Arc::clone(&store)),
            store,
        )
    }

    /// Waits until the manager's snapshot settles (loading == false).
    async fn settled(
        mgr: &SessionManager<TestProvider, TestStore>,
    ) -> SessionSnapshot {
        let mut rx = mgr.subscribe();
        rx.wait_for(|s| !s.loading).await.unwrap().clone()
    }

    fn profile(email: &str) -> SignUpProfile {
        SignUpProfile {
            first_name: "Avery".into(),
            last_name: "Quinn".into(),
            email: email.into(),
            phone: "555-0101".into(),
            birthdate: "06/15/1990".into(),
            role: Role::Unknown,
        }
    }

    fn therapist_application(email: &str) -> TherapistApplication {
        TherapistApplication {
            first_name: "Avery".into(),
            last_name: "Quinn".into(),
            email: email.into(),
            phone: "555-0101".into(),
            address: "12 Main St".into(),
            therapy_type: TherapyType::Physical,
            state: "OR".into(),
            cert_number: "C-9981".into(),
            cert_date: "01/15/2020".into(),
            cert_expiration: "01/15/2030".into(),
            insurance_expiration: "06/01/2027".into(),
            cert_files: vec!["cert_1.pdf".into()],
            insurance_files: vec!["insurance_1.pdf".into()],
        }
    }

    // =====================================================================
    // Startup / ambient resolution
    // =====================================================================

    #[tokio::test]
    async fn test_starts_initializing_until_ambient_resolves() {
        let provider = TestProvider::resolving();
        let (mgr, _store) = manager(Arc::clone(&provider));

        // Still resolving: loading, no routing decision possible.
        assert!(mgr.snapshot().loading);

        provider.tx.send_replace(AmbientSession::SignedOut);

        let snapshot = settled(&mgr).await;
        assert_eq!(snapshot.state, SessionState::Unauthenticated);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_restored_ambient_session_authenticates_without_sign_in() {
        // The provider found stored credentials: the user lands signed in
        // with no explicit operation.
        let provider =
            TestProvider::resolving().with_account("a@x.com", Role::Client);
        let restored = provider
            .identities
            .lock()
            .unwrap()
            .get("a@x.com")
            .cloned()
            .unwrap();
        provider
            .tx
            .send_replace(AmbientSession::SignedIn(restored));

        let (mgr, _store) = manager(provider);
        let snapshot = settled(&mgr).await;
        assert_eq!(
            snapshot.identity().unwrap().email,
            "a@x.com".to_string()
        );
    }

    // =====================================================================
    // sign_in
    // =====================================================================

    #[tokio::test]
    async fn test_sign_in_success_sets_identity_and_clears_loading() {
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        mgr.sign_in("a@x.com", "secret1").await.unwrap();

        let snapshot = mgr.snapshot();
        assert!(snapshot.state.is_authenticated());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_classifies_and_leaves_state() {
        let provider =
            TestProvider::resolved().with_account("bad@x.com", Role::Client);
        let (mgr, _store) = manager(Arc::clone(&provider));
        let before = settled(&mgr).await;

        provider.fail_next_verify(ProviderError::WrongPassword);
        let err = mgr.sign_in("bad@x.com", "wrong").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        let after = mgr.snapshot();
        assert_eq!(after.state, before.state);
        assert!(!after.loading);
    }

    #[tokio::test]
    async fn test_sign_in_rate_limited_classifies() {
        let provider = TestProvider::resolved();
        let (mgr, _store) = manager(Arc::clone(&provider));
        settled(&mgr).await;

        provider.fail_next_verify(ProviderError::TooManyAttempts);
        let err = mgr.sign_in("a@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
    }

    #[tokio::test]
    async fn test_failed_operation_releases_the_gate() {
        // A failure must not wedge the manager: the next operation runs.
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, _store) = manager(Arc::clone(&provider));
        settled(&mgr).await;

        provider.fail_next_verify(ProviderError::WrongPassword);
        assert!(mgr.sign_in("a@x.com", "wrong").await.is_err());

        mgr.sign_in("a@x.com", "right").await.unwrap();
        assert!(mgr.snapshot().state.is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_sign_in_rejected_not_merged() {
        // Two overlapping sign-ins: the second is rejected outright, so
        // the final state matches exactly one attempt.
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        provider.hang.store(true, Ordering::Release);
        let (mgr, _store) = manager(Arc::clone(&provider));
        let mgr = Arc::new(mgr);
        settled(&mgr).await;

        let first = {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.sign_in("a@x.com", "pw1").await })
        };
        // Let the first call reach the provider and park there.
        tokio::task::yield_now().await;

        let err = mgr.sign_in("b@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AuthError::OperationInFlight));

        first.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_times_out_against_unresponsive_provider() {
        let provider = TestProvider::resolved();
        provider.hang.store(true, Ordering::Release);
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        let err = mgr.sign_in("a@x.com", "pw").await.unwrap_err();

        assert!(matches!(err, AuthError::Timeout));
        // No permanent spinner after a timeout.
        assert!(!mgr.snapshot().loading);
    }

    // =====================================================================
    // sign_up / create_client_account
    // =====================================================================

    #[tokio::test]
    async fn test_sign_up_round_trip_email_readable_from_snapshot() {
        let provider = TestProvider::resolved();
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        let mut p = profile("a@x.com");
        p.role = Role::Client;
        mgr.sign_up(p, "secret1").await.unwrap();

        let snapshot = mgr.snapshot();
        let identity = snapshot.identity().unwrap();
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.display_name, "Avery Quinn");
        assert_eq!(identity.role, Role::Client);
    }

    #[tokio::test]
    async fn test_sign_up_blank_email_fails_before_provider_call() {
        // The provider is set to hang; if sign_up reached it, this test
        // would time out instead of failing fast.
        let provider = TestProvider::resolved();
        provider.hang.store(true, Ordering::Release);
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        let err = mgr.sign_up(profile("  "), "secret1").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidEmailFormat));
        assert!(!mgr.snapshot().loading);
    }

    #[tokio::test]
    async fn test_create_client_account_forces_client_role() {
        let provider = TestProvider::resolved();
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        // Profile says Unknown; the client-account path overrides it.
        mgr.create_client_account(profile("a@x.com"), "secret1")
            .await
            .unwrap();

        assert_eq!(
            mgr.snapshot().identity().unwrap().role,
            Role::Client
        );
    }

    #[tokio::test]
    async fn test_create_client_account_duplicate_email_no_transition() {
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;

        let err = mgr
            .create_client_account(profile("a@x.com"), "secret1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailAlreadyInUse));
        assert_eq!(mgr.snapshot().state, SessionState::Unauthenticated);
    }

    // =====================================================================
    // Role applications
    // =====================================================================

    #[tokio::test]
    async fn test_therapist_application_creates_account_and_retags() {
        let provider = TestProvider::resolved();
        let (mgr, store) = manager(provider);
        settled(&mgr).await;

        let id = mgr
            .create_therapist_application(
                therapist_application("t@x.com"),
                "secret1",
            )
            .await
            .unwrap();

        let snapshot = mgr.snapshot();
        let identity = snapshot.identity().unwrap();
        assert_eq!(identity.role, Role::Therapist);
        assert_eq!(identity.display_name, "Avery Quinn");

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].applicant, identity.id);
        assert_eq!(records[0].role, Role::Therapist);
        assert_eq!(records[0].status, ApplicationStatus::Pending);
        let _ = id;
    }

    #[tokio::test]
    async fn test_therapist_application_reuses_signed_in_identity() {
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, store) = manager(provider);
        settled(&mgr).await;
        mgr.sign_in("a@x.com", "secret1").await.unwrap();
        let signed_in = mgr.snapshot().identity().unwrap().id.clone();

        mgr.create_therapist_application(
            therapist_application("a@x.com"),
            "ignored",
        )
        .await
        .unwrap();

        // Same account, new role — no second identity was created.
        let identity = mgr.snapshot().identity().cloned().unwrap();
        assert_eq!(identity.id, signed_in);
        assert_eq!(identity.role, Role::Therapist);
        assert_eq!(
            store.records.lock().unwrap()[0].applicant,
            signed_in
        );
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_and_role_unchanged() {
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, store) = manager(provider);
        settled(&mgr).await;
        mgr.sign_in("a@x.com", "secret1").await.unwrap();

        store.offline.store(true, Ordering::Release);
        let err = mgr
            .create_therapist_application(
                therapist_application("a@x.com"),
                "ignored",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::StoreUnavailable));
        // The failed submission must not have retagged the identity.
        assert_eq!(
            mgr.snapshot().identity().unwrap().role,
            Role::Client
        );
        assert!(!mgr.snapshot().loading);
    }

    // =====================================================================
    // sign_out
    // =====================================================================

    #[tokio::test]
    async fn test_sign_out_clears_identity() {
        let provider =
            TestProvider::resolved().with_account("a@x.com", Role::Client);
        let (mgr, _store) = manager(provider);
        settled(&mgr).await;
        mgr.sign_in("a@x.com", "secret1").await.unwrap();

        mgr.sign_out().await.unwrap();

        let snapshot = mgr.snapshot();
        assert_eq!(snapshot.state, SessionState::Unauthenticated);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_sign_out_idempotent_when_unauthenticated() {
        let provider = TestProvider::resolved();
        let (mgr, _store) = manager(provider);
        let before = settled(&mgr).await;

        mgr.sign_out().await.unwrap();

        assert_eq!(mgr.snapshot(), before);
    }
}
