//! The in-memory application store.

use careline_session::{
    ApplicationId, ApplicationRecord, ApplicationStore, StoreError,
};

/// An [`ApplicationStore`] that keeps submissions in an append-only log.
///
/// Records are stored exactly as submitted — the session layer has
/// already tagged them pending with a submission timestamp. The offline
/// switch exists to exercise the `StoreUnavailable` path in tests.
pub struct MemoryApplicationStore {
    inner: std::sync::Mutex<StoreState>,
}

struct StoreState {
    records: Vec<(ApplicationId, ApplicationRecord)>,
    online: bool,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Mutex::new(StoreState {
                records: Vec::new(),
                online: true,
            }),
        }
    }

    /// Simulates the store going down (or coming back).
    pub fn set_online(&self, online: bool) {
        self.inner.lock().expect("store lock").online = online;
    }

    /// All submissions received so far, in order.
    pub fn submissions(&self) -> Vec<(ApplicationId, ApplicationRecord)> {
        self.inner.lock().expect("store lock").records.clone()
    }

    /// Looks up one submission by id.
    pub fn find(&self, id: ApplicationId) -> Option<ApplicationRecord> {
        self.inner
            .lock()
            .expect("store lock")
            .records
            .iter()
            .find(|(record_id, _)| *record_id == id)
            .map(|(_, record)| record.clone())
    }
}

impl Default for MemoryApplicationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationStore for MemoryApplicationStore {
    async fn submit_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationId, StoreError> {
        let mut state = self.inner.lock().expect("store lock");
        if !state.online {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        let id = ApplicationId::new();
        tracing::info!(
            application = %id,
            applicant = %record.applicant,
            role = %record.role,
            "application stored"
        );
        state.records.push((id, record));
        Ok(id)
    }
}

// =========================================================================
// Tests
// =========================================================================
