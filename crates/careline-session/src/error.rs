//! Error types for the session layer.
//!
//! Two levels: [`ProviderError`] and [`StoreError`] are the raw failure
//! codes of the external collaborators; [`AuthError`] is the small, fixed
//! taxonomy the session manager classifies them into and re-raises to
//! callers. Screens present a message per `AuthError` kind and never see
//! provider-specific codes.

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Raw failure codes from the identity provider.
///
/// `Clone` so test providers can script a queue of responses.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// No account matches the given email.
    #[error("no account matches this email")]
    NotFound,

    /// The password doesn't match the account.
    #[error("wrong password")]
    WrongPassword,

    /// The email is syntactically invalid.
    #[error("malformed email address")]
    InvalidEmail,

    /// An account with this email already exists.
    #[error("email is already registered")]
    EmailInUse,

    /// The password fails the provider's strength policy.
    #[error("password rejected by policy")]
    WeakPassword,

    /// Too many failed attempts in the provider's window.
    #[error("too many failed attempts")]
    TooManyAttempts,

    /// Anything else — network failure, internal provider error.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Failure codes from the application store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("application store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// AuthError — what callers see
// ---------------------------------------------------------------------------

/// The error taxonomy session operations re-raise to callers.
///
/// Failures are never retried automatically and never swallowed; the
/// manager resets its loading flag before any of these reach the caller,
/// so a failed operation can't leave the UI stuck on a spinner.
/// `RateLimited` and `Unknown` are the only kinds worth retrying, and
/// only on explicit user re-submission.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password combination rejected. Deliberately covers both
    /// "no such account" and "wrong password" so the sign-in screen
    /// doesn't leak which emails are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account.
    #[error("an account with this email already exists")]
    EmailAlreadyInUse,

    #[error("invalid email address")]
    InvalidEmailFormat,

    /// Policy-rejected password on sign-up.
    #[error("password does not meet the minimum requirements")]
    WeakPassword,

    /// Too many attempts in a window; try again later.
    #[error("too many attempts, please try again later")]
    RateLimited,

    /// The provider (or store) didn't answer within the configured bound.
    #[error("the service did not respond in time")]
    Timeout,

    /// Another mutating operation is still in flight; this one was
    /// rejected, not queued.
    #[error("another account operation is already in progress")]
    OperationInFlight,

    /// The application store rejected or couldn't take the submission.
    #[error("could not submit the application, please try again")]
    StoreUnavailable,

    /// Unclassified provider failure.
    #[error("authentication failed: {0}")]
    Unknown(String),
}

/// Classification of provider codes into the caller-facing taxonomy.
impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound | ProviderError::WrongPassword => {
                Self::InvalidCredentials
            }
            ProviderError::InvalidEmail => Self::InvalidEmailFormat,
            ProviderError::EmailInUse => Self::EmailAlreadyInUse,
            ProviderError::WeakPassword => Self::WeakPassword,
            ProviderError::TooManyAttempts => Self::RateLimited,
            ProviderError::Unavailable(detail) => Self::Unknown(detail),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::StoreUnavailable,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_and_wrong_password_both_map_to_invalid_credentials() {
        // The sign-in screen must not reveal whether an email is
        // registered, so both codes collapse into one kind.
        assert!(matches!(
            AuthError::from(ProviderError::NotFound),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(ProviderError::WrongPassword),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_provider_code_classification() {
        assert!(matches!(
            AuthError::from(ProviderError::InvalidEmail),
            AuthError::InvalidEmailFormat
        ));
        assert!(matches!(
            AuthError::from(ProviderError::EmailInUse),
            AuthError::EmailAlreadyInUse
        ));
        assert!(matches!(
            AuthError::from(ProviderError::WeakPassword),
            AuthError::WeakPassword
        ));
        assert!(matches!(
            AuthError::from(ProviderError::TooManyAttempts),
            AuthError::RateLimited
        ));
    }

    #[test]
    fn test_unavailable_maps_to_unknown_with_detail() {
        let err =
            AuthError::from(ProviderError::Unavailable("dns failure".into()));
        match err {
            AuthError::Unknown(detail) => {
                assert_eq!(detail, "dns failure")
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_store_error_maps_to_store_unavailable() {
        assert!(matches!(
            AuthError::from(StoreError::Unavailable("offline".into())),
            AuthError::StoreUnavailable
        ));
    }
}
