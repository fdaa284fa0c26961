//! Unified error type for the Careline stack.

use careline_identity::ValidationError;
use careline_session::AuthError;

/// Top-level error that wraps the crate-specific errors.
///
/// When using the `careline` meta-crate, a flow function can return this
/// single type and let `?` convert validation and session errors
/// automatically via the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum CarelineError {
    /// A form failed local validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A session operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}
