//! Identity model for Careline.
//!
//! This crate defines the data every other layer agrees on:
//!
//! - **Who a user is** ([`Identity`], [`UserId`], [`Role`]) — the record the
//!   session layer holds while someone is signed in.
//! - **What the sign-up and application forms collect** ([`SignUpProfile`],
//!   [`TherapistApplication`], [`PartnerApplication`]) — the payloads the
//!   screens assemble and hand to the session layer.
//! - **Which inputs are acceptable** ([`validate`]) — the field-level rules
//!   the screens enforce before any remote call is made.
//!
//! # Architecture
//!
//! The identity crate sits at the bottom of the stack. It knows nothing
//! about providers, sessions, or storage — it only defines shapes and
//! local rules.
//!
//! ```text
//! Session layer (above)   ← holds an Identity, moves it through states
//!     ↕
//! Identity layer (this crate)   ← types + validation, no I/O
//! ```

mod application;
mod error;
mod types;
pub mod validate;

pub use application::{
    ApplicationStatus, PartnerApplication, TherapistApplication, TherapyType,
};
pub use error::{FieldError, ValidationError};
pub use types::{Identity, Role, SignUpProfile, UserId};
