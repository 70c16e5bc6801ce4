//! `WebAuthn` service implementation
//!
//! This module builds credential creation options and checks the client's
//! registration response against them.

use uuid::Uuid;

use super::attestation::{self, WEBAUTHN_CREATE};
use super::crypto;
use super::errors::WebAuthnError;
use super::preference::AttestationPreference;
use super::settings::WebAuthnSettings;
use super::types::{
    AuthenticatorSelectionCriteria, CollectedClientData, PublicKeyCredentialDescriptor,
    PublicKeyCredentialParameters, RegistrationOptions, RegistrationResponse, RelyingParty,
    UserEntity, COSE_ALG_ES256, COSE_ALG_RS256,
};

/// Generate a user handle for a new account
///
/// # Returns
/// A unique user handle string that can be used for `WebAuthn` operations
#[must_use]
pub fn generate_user_handle() -> String {
    Uuid::new_v4().to_string()
}

/// Core `WebAuthn` service
#[derive(Debug, Clone)]
pub struct WebAuthnService {
    settings: WebAuthnSettings,
}

impl WebAuthnService {
    /// Create a new `WebAuthnService` with the given settings
    ///
    /// # Errors
    /// Returns `WebAuthnError::ConfigurationError` if the relying party id or
    /// origin is empty
    pub fn new(settings: WebAuthnSettings) -> Result<Self, WebAuthnError> {
        if settings.rp_id.trim().is_empty() {
            return Err(WebAuthnError::ConfigurationError(
                "rp_id must not be empty".to_string(),
            ));
        }
        if settings.rp_origin.trim().is_empty() {
            return Err(WebAuthnError::ConfigurationError(
                "rp_origin must not be empty".to_string(),
            ));
        }
        Ok(Self { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &WebAuthnSettings {
        &self.settings
    }

    /// Create registration options for a new credential
    ///
    /// # Arguments
    /// * `user_handle` - User handle (unique identifier)
    /// * `user_name` - User name (e.g., email)
    /// * `display_name` - User display name
    /// * `attestation` - Attestation conveyance the relying party asks for
    /// * `exclude_credentials` - Credential ids already registered for the user
    ///
    /// # Errors
    /// Returns `WebAuthnError::InternalError` if no challenge can be generated
    pub fn start_registration(
        &self,
        user_handle: &str,
        user_name: &str,
        display_name: &str,
        attestation: AttestationPreference,
        exclude_credentials: &[String],
    ) -> Result<RegistrationOptions, WebAuthnError> {
        let challenge = crypto::generate_challenge()?;

        Ok(RegistrationOptions {
            challenge,
            rp: RelyingParty {
                id: self.settings.rp_id.clone(),
                name: self.settings.rp_name.clone(),
            },
            user: UserEntity {
                id: user_handle.to_string(),
                name: user_name.to_string(),
                display_name: display_name.to_string(),
            },
            public_key_params: vec![
                PublicKeyCredentialParameters::public_key(COSE_ALG_ES256),
                PublicKeyCredentialParameters::public_key(COSE_ALG_RS256),
            ],
            timeout: self.settings.timeout_millis(),
            attestation,
            authenticator_selection: AuthenticatorSelectionCriteria {
                authenticator_attachment: self.settings.authenticator_attachment.clone(),
                require_resident_key: self.settings.require_resident_key,
                user_verification: self.settings.user_verification.clone(),
            },
            exclude_credentials: exclude_credentials
                .iter()
                .map(|id| PublicKeyCredentialDescriptor {
                    r#type: "public-key".to_string(),
                    id: id.clone(),
                })
                .collect(),
        })
    }

    /// Check a registration response's client data against the issued options
    ///
    /// Attestation statement and signature verification are left to the caller.
    ///
    /// # Errors
    /// Returns a `WebAuthnError` if the response is malformed or its client data
    /// does not match the type, challenge and origin we expect
    pub fn verify_registration_client_data(
        &self,
        response: &RegistrationResponse,
        options: &RegistrationOptions,
    ) -> Result<CollectedClientData, WebAuthnError> {
        if response.r#type != "public-key" {
            return Err(WebAuthnError::VerificationFailed(format!(
                "Unexpected credential type {}",
                response.r#type
            )));
        }

        attestation::verify_client_data(
            &response.response.client_data_json,
            WEBAUTHN_CREATE,
            &options.challenge,
            &self.settings.rp_origin,
        )
    }
}
