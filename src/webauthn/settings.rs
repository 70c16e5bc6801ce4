//! `WebAuthn` settings implementation
//!
//! This module defines relying party settings used when generating
//! credential creation options.

use serde::{Deserialize, Serialize};

use super::preference::AttestationPreference;

/// `WebAuthn` settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebAuthnSettings {
    /// Relying Party ID (usually the domain)
    pub rp_id: String,
    /// Relying Party name (displayed to user)
    pub rp_name: String,
    /// Relying Party origin (e.g., <https://example.com>)
    pub rp_origin: String,
    /// Timeout in seconds the client is given to complete the ceremony
    pub timeout_seconds: u64,
    /// User verification preference ("required", "preferred", "discouraged")
    pub user_verification: String,
    /// Optional authenticator attachment ("platform", "cross-platform")
    pub authenticator_attachment: Option<String>,
    pub require_resident_key: bool,
    /// Attestation requested when the caller does not pick one explicitly
    pub attestation: AttestationPreference,
}

impl WebAuthnSettings {
    /// Client timeout in milliseconds, saturating at `u32::MAX`
    #[must_use]
    pub fn timeout_millis(&self) -> u32 {
        u32::try_from(self.timeout_seconds.saturating_mul(1000)).unwrap_or(u32::MAX)
    }
}

impl Default for WebAuthnSettings {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Passkey Registry".to_string(),
            rp_origin: "https://localhost".to_string(),
            timeout_seconds: 60,
            user_verification: "preferred".to_string(),
            authenticator_attachment: None,
            require_resident_key: false,
            attestation: AttestationPreference::default(),
        }
    }
}
