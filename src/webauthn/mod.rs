//! `WebAuthn` implementation
//!
//! This module provides the `WebAuthn` pieces a relying party needs around a
//! registration ceremony: attestation preferences, option generation and
//! client data checks. It knows nothing about how pending registrations are
//! stored.

mod attestation;
mod crypto;
mod errors;
mod preference;
mod service;
mod settings;
mod types;

// Re-exports for public use
pub use attestation::{decode_client_data, verify_client_data, WEBAUTHN_CREATE};
pub use crypto::{generate_challenge, generate_request_id, CHALLENGE_LEN, REQUEST_ID_LEN};
pub use errors::WebAuthnError;
pub use preference::{AttestationPreference, UnknownPreference};
pub use service::{generate_user_handle, WebAuthnService};
pub use settings::WebAuthnSettings;
pub use types::*;
