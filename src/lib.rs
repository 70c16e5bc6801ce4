#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Single-use, expiring correlation of `WebAuthn` registration requests
//!
//! A relying party starts a registration with
//! [`RegistrationService::start_registration`], hands the returned
//! [`RegistrationRequest`] to the client, and later finishes it with
//! [`RegistrationService::finish_registration`]. In between, the issued
//! credential creation options sit in a [`RegistrationSessionStore`] that
//! releases them exactly once, before they expire.

/// Version of the passkey-registry crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod registration;
pub mod settings;
pub mod webauthn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use registration::{
    spawn_expiry_sweeper, PendingRegistration, RegisteredCredential, RegistrationError,
    RegistrationRequest, RegistrationService, RegistrationServiceError, RegistrationSessionStore,
    RegistrationStoreConfig, RequestId, StartRegistration,
};
pub use settings::RegistrySettings;
pub use webauthn::{AttestationPreference, UnknownPreference, WebAuthnService, WebAuthnSettings};
