//! Role-upgrade application payloads.
//!
//! Therapists and partner businesses don't get their role at sign-up —
//! they *apply* for it. These are the payloads their multi-step
//! application forms assemble. The session layer forwards them to the
//! application store verbatim; review happens on the platform side, which
//! is why every submission starts out [`ApplicationStatus::Pending`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TherapyType
// ---------------------------------------------------------------------------

/// The service categories offered on the platform.
///
/// Both application forms ask applicants to pick one. `Other` is a real
/// choice on the form, not a fallback for bad data — decoding an
/// unrecognized value is still an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapyType {
    Physical,
    Occupational,
    Speech,
    MentalHealth,
    Massage,
    Other,
}

impl fmt::Display for TherapyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The labels the forms show.
        match self {
            Self::Physical => write!(f, "Physical Therapy"),
            Self::Occupational => write!(f, "Occupational Therapy"),
            Self::Speech => write!(f, "Speech Therapy"),
            Self::MentalHealth => write!(f, "Mental Health Counseling"),
            Self::Massage => write!(f, "Massage Therapy"),
            Self::Other => write!(f, "Other"),
        }
    }
}

// ---------------------------------------------------------------------------
// ApplicationStatus
// ---------------------------------------------------------------------------

/// Review state of a submitted application.
///
/// The client only ever *creates* `Pending` records; `Approved` and
/// `Rejected` are written by the platform's review process and read back
/// when the applicant checks their status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

// ---------------------------------------------------------------------------
// TherapistApplication
// ---------------------------------------------------------------------------

/// Everything the three-step therapist application collects.
///
/// Step 1 covers contact details and the service category, step 2 covers
/// credentials (certification and insurance), step 3 is review-and-submit.
/// Dates stay in the form's `MM/DD/YYYY` text format; file fields hold
/// upload references (names or storage keys), not file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TherapistApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub therapy_type: TherapyType,

    /// Licensing state/region.
    pub state: String,
    pub cert_number: String,
    /// Certification issue date, `MM/DD/YYYY`.
    pub cert_date: String,
    /// Certification expiration, `MM/DD/YYYY`.
    pub cert_expiration: String,
    /// Liability insurance expiration, `MM/DD/YYYY`.
    pub insurance_expiration: String,

    /// References to the uploaded certification documents.
    pub cert_files: Vec<String>,
    /// References to the uploaded insurance documents.
    pub insurance_files: Vec<String>,
}

// ---------------------------------------------------------------------------
// PartnerApplication
// ---------------------------------------------------------------------------

/// Everything the two-step partner-business application collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerApplication {
    pub business_name: String,
    pub manager_first_name: String,
    pub manager_last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub therapy_type: TherapyType,

    /// Optional — not every business has one.
    #[serde(default)]
    pub website: String,
    /// When the business started operating, `MM/DD/YYYY`.
    pub business_start_date: String,
    /// References to the uploaded business license documents.
    pub license_files: Vec<String>,
}

// =========================================================================
// Tests
// =========================================================================
