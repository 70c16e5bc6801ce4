//! Registration ceremony records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pending::RequestId;
use crate::webauthn::{AttestationPreference, RegistrationOptions};

/// Input to start a registration ceremony
#[derive(Debug, Clone, Default)]
pub struct StartRegistration {
    pub username: String,
    /// Shown by the authenticator; the username is used when absent
    pub display_name: Option<String>,
    /// Label the user gives this credential
    pub credential_nickname: String,
    /// Overrides the configured attestation preference
    pub attestation: Option<AttestationPreference>,
    /// Credential ids the user already has, so authenticators skip them
    pub exclude_credentials: Vec<String>,
}

/// What the client receives when a registration starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub username: String,
    pub credential_nickname: String,
    pub request_id: RequestId,
    pub public_key_credential_creation_options: RegistrationOptions,
}

/// A registration whose client data matched what was issued
///
/// The attestation object is passed through untouched for statement
/// verification and credential storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredCredential {
    pub username: String,
    pub credential_nickname: String,
    pub credential_id: String,
    pub user_handle: String,
    pub attestation: AttestationPreference,
    pub attestation_object: String,
    pub registered_at: DateTime<Utc>,
}
