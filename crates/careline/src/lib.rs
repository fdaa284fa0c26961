//! # Careline
//!
//! Client-side session and identity core for the Careline marketplace —
//! the state machine behind the sign-in, sign-up, and role-application
//! flows that connect clients, therapists, and partner businesses.
//!
//! This meta-crate re-exports the whole stack and adds the two pieces
//! that tie it together: a unified error type ([`CarelineError`]) and the
//! role-based routing decision ([`route_for`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use careline::prelude::*;
//!
//! # async fn run() -> Result<(), CarelineError> {
//! let directory = Arc::new(MemoryDirectory::new());
//! let store = Arc::new(MemoryApplicationStore::new());
//! let session =
//!     SessionManager::new(Arc::clone(&directory), Arc::clone(&store));
//!
//! directory.resolve_ambient();
//! session.sign_in("avery@example.com", "secret-pw").await?;
//!
//! assert_eq!(route_for(&session.snapshot()), Route::ClientHome);
//! # Ok(())
//! # }
//! ```

mod error;
mod nav;

pub use error::CarelineError;
pub use nav::{Route, route_for};

pub use careline_directory::{
    DirectoryConfig, MemoryApplicationStore, MemoryDirectory,
};
pub use careline_identity::{
    ApplicationStatus, FieldError, Identity, PartnerApplication, Role,
    SignUpProfile, TherapistApplication, TherapyType, UserId,
    ValidationError, validate,
};
pub use careline_session::{
    AmbientSession, ApplicationId, ApplicationPayload, ApplicationRecord,
    ApplicationStore, AuthError, IdentityProvider, ProfileUpdate,
    ProviderError, SessionConfig, SessionManager, SessionSnapshot,
    SessionState, StoreError,
};

/// One-stop imports for application code.
pub mod prelude {
    pub use crate::error::CarelineError;
    pub use crate::nav::{Route, route_for};
    pub use careline_directory::{MemoryApplicationStore, MemoryDirectory};
    pub use careline_identity::{
        Identity, PartnerApplication, Role, SignUpProfile,
        TherapistApplication, TherapyType,
    };
    pub use careline_session::{
        AuthError, SessionManager, SessionSnapshot, SessionState,
    };
}
