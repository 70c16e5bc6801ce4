//! Fluent builders for client registration responses
//!
//! Browsers send `clientDataJSON` Base64URL-encoded; these builders produce
//! that shape from plain fields so tests can tweak one thing at a time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::registration::RegistrationRequest;
use crate::webauthn::{
    AuthenticatorAttestationResponse, CollectedClientData, RegistrationResponse, WEBAUTHN_CREATE,
};

use super::constants::{TEST_ATTESTATION_OBJECT, TEST_CREDENTIAL_ID, TEST_ORIGIN};

/// Builder for a client's registration response
pub struct RegistrationResponseBuilder {
    client_data: CollectedClientData,
    credential_id: String,
    attestation_object: String,
    credential_type: String,
}

impl RegistrationResponseBuilder {
    /// Response answering `challenge` from the test origin
    #[must_use]
    pub fn new(challenge: &str) -> Self {
        Self {
            client_data: CollectedClientData {
                r#type: WEBAUTHN_CREATE.to_string(),
                challenge: challenge.to_string(),
                origin: TEST_ORIGIN.to_string(),
                cross_origin: false,
            },
            credential_id: TEST_CREDENTIAL_ID.to_string(),
            attestation_object: TEST_ATTESTATION_OBJECT.to_string(),
            credential_type: "public-key".to_string(),
        }
    }

    /// Response answering the challenge issued in `request`
    #[must_use]
    pub fn for_request(request: &RegistrationRequest) -> Self {
        Self::new(&request.public_key_credential_creation_options.challenge)
    }

    #[must_use]
    pub fn with_challenge(mut self, challenge: &str) -> Self {
        self.client_data.challenge = challenge.to_string();
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.client_data.origin = origin.to_string();
        self
    }

    #[must_use]
    pub fn with_client_data_type(mut self, client_data_type: &str) -> Self {
        self.client_data.r#type = client_data_type.to_string();
        self
    }

    #[must_use]
    pub fn with_credential_id(mut self, credential_id: &str) -> Self {
        self.credential_id = credential_id.to_string();
        self
    }

    /// Build the response
    ///
    /// # Panics
    /// Panics if the client data cannot be serialized
    #[must_use]
    pub fn build(self) -> RegistrationResponse {
        let client_data_json =
            serde_json::to_vec(&self.client_data).expect("client data should serialize");

        RegistrationResponse {
            id: self.credential_id.clone(),
            raw_id: self.credential_id,
            response: AuthenticatorAttestationResponse {
                client_data_json: URL_SAFE_NO_PAD.encode(client_data_json),
                attestation_object: self.attestation_object,
            },
            client_extension_results: None,
            r#type: self.credential_type,
        }
    }
}
