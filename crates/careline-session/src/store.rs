//! The application-store seam.
//!
//! Role-upgrade applications (therapist, partner) carry far more data
//! than an identity profile holds — credentials, insurance, business
//! documents. That payload goes to a durable store on the platform side,
//! keyed by the applicant's account id, where the review team picks it
//! up. This module defines the minimum contract the session layer needs
//! to hand a submission off.

use std::fmt;

use careline_identity::{
    ApplicationStatus, PartnerApplication, Role, TherapistApplication,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreError;

// ---------------------------------------------------------------------------
// ApplicationId
// ---------------------------------------------------------------------------

/// A unique identifier for a submitted application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ApplicationPayload / ApplicationRecord
// ---------------------------------------------------------------------------

/// The role-specific form data inside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ApplicationPayload {
    Therapist(TherapistApplication),
    Partner(PartnerApplication),
}

/// A complete submission as handed to the store.
///
/// The session layer — not the store — stamps `status` and
/// `submitted_at`, so every store implementation receives records already
/// tagged `pending` with their submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// The account this application belongs to.
    pub applicant: UserId,
    /// The role being applied for.
    pub role: Role,
    /// Always [`ApplicationStatus::Pending`] at submission.
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub payload: ApplicationPayload,
}

// ---------------------------------------------------------------------------
// ApplicationStore
// ---------------------------------------------------------------------------

/// Durable storage for application submissions.
pub trait ApplicationStore: Send + Sync + 'static {
    /// Persists a submission and returns its assigned id.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] when the store can't be reached.
    fn submit_application(
        &self,
        record: ApplicationRecord,
    ) -> impl std::future::Future<Output = Result<ApplicationId, StoreError>> + Send;
}
