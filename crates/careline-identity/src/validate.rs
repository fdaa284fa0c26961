//! Field-level form validation.
//!
//! These are the rules the screens enforce *before* anything is sent to
//! the session layer: required fields, email shape, date format, and the
//! minimum-age restriction for client accounts. Validation is purely
//! local — the identity provider applies its own policies (duplicate
//! emails, password strength) and those failures surface through the
//! session layer's error taxonomy instead.
//!
//! Every function returns the *full* list of failing fields so the UI can
//! mark all of them in one pass.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    FieldError, PartnerApplication, SignUpProfile, TherapistApplication,
    ValidationError,
};

/// The minimum age to hold a client account.
pub const MINIMUM_AGE_YEARS: i32 = 18;

/// Loose email shape check: something, an `@`, something, a dot,
/// something. Real verification happens via the confirmation email; this
/// only catches obvious typos.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static pattern"));

/// Strict `MM/DD/YYYY` shape, two-digit month and day.
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static pattern"));

/// Returns `true` if `email` looks like an email address.
pub fn email_is_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Parses a form date in `MM/DD/YYYY` format.
///
/// Returns `None` when the shape is wrong ("1/2/2020") or the date
/// doesn't exist on the calendar ("02/30/2020").
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").ok()
}

/// Returns `true` if someone born on `birthdate` is at least
/// [`MINIMUM_AGE_YEARS`] old on `today`.
///
/// Calendar-accurate: the cutoff is "today minus 18 years", so a person
/// becomes eligible exactly on their 18th birthday. A Feb 29 `today` in a
/// year where `today - 18` doesn't exist rolls the cutoff forward to
/// Mar 1.
pub fn meets_minimum_age(birthdate: NaiveDate, today: NaiveDate) -> bool {
    use chrono::Datelike;

    let cutoff = NaiveDate::from_ymd_opt(
        today.year() - MINIMUM_AGE_YEARS,
        today.month(),
        today.day(),
    )
    .unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(today.year() - MINIMUM_AGE_YEARS, 3, 1)
            .expect("Mar 1 exists in every year")
    });

    birthdate <= cutoff
}

// ---------------------------------------------------------------------------
// Per-form validation
// ---------------------------------------------------------------------------

/// Validates the client sign-up form.
///
/// `today` is injected rather than read from the clock so the age rule is
/// deterministic under test; callers pass the current date.
///
/// # Errors
/// Returns a [`ValidationError`] listing every failing field.
pub fn validate_sign_up(
    profile: &SignUpProfile,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    let mut fields = Vec::new();

    require(&mut fields, "first_name", &profile.first_name, "First name is required");
    require(&mut fields, "last_name", &profile.last_name, "Last name is required");
    require(&mut fields, "phone", &profile.phone, "Phone number is required");
    check_email(&mut fields, &profile.email);

    let birthdate = profile.birthdate.trim();
    if birthdate.is_empty() {
        fields.push(FieldError::new("birthdate", "Birthdate is required"));
    } else {
        match parse_form_date(birthdate) {
            None => fields.push(FieldError::new(
                "birthdate",
                "Please use MM/DD/YYYY format",
            )),
            Some(date) if !meets_minimum_age(date, today) => {
                fields.push(FieldError::new(
                    "birthdate",
                    "You must be at least 18 years old",
                ));
            }
            Some(_) => {}
        }
    }

    finish(fields)
}

/// Validates a complete therapist application (all steps).
///
/// # Errors
/// Returns a [`ValidationError`] listing every failing field.
pub fn validate_therapist_application(
    application: &TherapistApplication,
) -> Result<(), ValidationError> {
    let mut fields = Vec::new();

    require(&mut fields, "first_name", &application.first_name, "First name is required");
    require(&mut fields, "last_name", &application.last_name, "Last name is required");
    require(&mut fields, "phone", &application.phone, "Phone number is required");
    check_email(&mut fields, &application.email);
    require(&mut fields, "state", &application.state, "State is required");
    require(&mut fields, "cert_number", &application.cert_number, "Certification number is required");
    check_date(&mut fields, "cert_date", &application.cert_date, "Certification date is required");
    check_date(&mut fields, "cert_expiration", &application.cert_expiration, "Certification expiration is required");
    check_date(&mut fields, "insurance_expiration", &application.insurance_expiration, "Insurance expiration is required");

    if application.cert_files.is_empty() {
        fields.push(FieldError::new(
            "cert_files",
            "At least one certification file is required",
        ));
    }
    if application.insurance_files.is_empty() {
        fields.push(FieldError::new(
            "insurance_files",
            "At least one insurance file is required",
        ));
    }

    finish(fields)
}

/// Validates a complete partner-business application (all steps).
///
/// # Errors
/// Returns a [`ValidationError`] listing every failing field.
pub fn validate_partner_application(
    application: &PartnerApplication,
) -> Result<(), ValidationError> {
    let mut fields = Vec::new();

    require(&mut fields, "business_name", &application.business_name, "Business name is required");
    require(&mut fields, "manager_first_name", &application.manager_first_name, "Manager first name is required");
    require(&mut fields, "manager_last_name", &application.manager_last_name, "Manager last name is required");
    require(&mut fields, "phone", &application.phone, "Phone number is required");
    check_email(&mut fields, &application.email);
    check_date(&mut fields, "business_start_date", &application.business_start_date, "Business start date is required");

    if application.license_files.is_empty() {
        fields.push(FieldError::new(
            "license_files",
            "At least one business license file is required",
        ));
    }

    finish(fields)
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

fn require(
    fields: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &str,
) {
    if value.trim().is_empty() {
        fields.push(FieldError::new(field, message));
    }
}

fn check_email(fields: &mut Vec<FieldError>, email: &str) {
    if email.trim().is_empty() {
        fields.push(FieldError::new("email", "Email is required"));
    } else if !email_is_valid(email) {
        fields.push(FieldError::new("email", "Please enter a valid email"));
    }
}

fn check_date(
    fields: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    required_message: &str,
) {
    if value.trim().is_empty() {
        fields.push(FieldError::new(field, required_message));
    } else if parse_form_date(value.trim()).is_none() {
        fields.push(FieldError::new(field, "Please use MM/DD/YYYY format"));
    }
}

fn finish(fields: Vec<FieldError>) -> Result<(), ValidationError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { fields })
    }
}

// =========================================================================
// Tests
// =========================================================================
