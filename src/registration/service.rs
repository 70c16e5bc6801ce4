//! Registration ceremony service
//!
//! Starts a registration by generating credential creation options and
//! parking them in the pending registration store, then finishes it by taking
//! those options back out and checking the client's response against them.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::errors::{RegistrationError, GENERIC_REJECTION};
use super::store::RegistrationSessionStore;
use super::sweeper;
use super::types::{RegisteredCredential, RegistrationRequest, StartRegistration};
use crate::settings::RegistrySettings;
use crate::webauthn::{generate_user_handle, RegistrationResponse, WebAuthnError, WebAuthnService};

/// Error types for registration ceremony operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationServiceError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown, consumed or expired request id; the cause is not disclosed
    #[error("{}", GENERIC_REJECTION)]
    Rejected,

    /// Transient; the caller may retry later
    #[error("Registration temporarily unavailable: {0}")]
    Unavailable(String),

    /// Client response did not match the issued options
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RegistrationError> for RegistrationServiceError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::UnknownRequest | RegistrationError::Expired => {
                // Distinguished in logs and metrics only
                debug!("Registration rejected: {error}");
                Self::Rejected
            }
            RegistrationError::CapacityExceeded { .. } => Self::Unavailable(error.to_string()),
            RegistrationError::IdentifierGeneration(msg) => Self::Internal(msg),
        }
    }
}

impl From<WebAuthnError> for RegistrationServiceError {
    fn from(error: WebAuthnError) -> Self {
        match error {
            WebAuthnError::VerificationFailed(msg) | WebAuthnError::EncodingError(msg) => {
                Self::VerificationFailed(msg)
            }
            WebAuthnError::ConfigurationError(msg) | WebAuthnError::InternalError(msg) => {
                Self::Internal(msg)
            }
        }
    }
}

/// Registration ceremony: option generation plus single-use correlation
#[derive(Debug, Clone)]
pub struct RegistrationService {
    webauthn: WebAuthnService,
    store: Arc<RegistrationSessionStore>,
}

impl RegistrationService {
    #[must_use]
    pub fn new(webauthn: WebAuthnService, store: Arc<RegistrationSessionStore>) -> Self {
        Self { webauthn, store }
    }

    /// Build the service and its store from settings
    ///
    /// # Errors
    /// Returns `WebAuthnError::ConfigurationError` if the relying party settings
    /// are unusable
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self, WebAuthnError> {
        let webauthn = WebAuthnService::new(settings.webauthn.clone())?;
        let store = Arc::new(RegistrationSessionStore::new(
            settings.registration.store_config(),
        ));
        Ok(Self::new(webauthn, store))
    }

    /// Shared store, e.g. for the expiry sweeper
    #[must_use]
    pub fn store(&self) -> &Arc<RegistrationSessionStore> {
        &self.store
    }

    #[must_use]
    pub fn webauthn(&self) -> &WebAuthnService {
        &self.webauthn
    }

    /// Start evicting abandoned registrations from this service's store
    ///
    /// Pass `RegistrationSettings::sweep_interval()` to honour the configured
    /// period. Abort the handle to stop sweeping.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime
    pub fn spawn_expiry_sweeper(&self, every: Duration) -> JoinHandle<()> {
        sweeper::spawn_expiry_sweeper(Arc::clone(&self.store), every)
    }

    /// Start a registration ceremony
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The username is blank
    /// - Too many registrations are already in progress
    /// - No challenge or request id could be generated
    pub fn start_registration(
        &self,
        request: StartRegistration,
    ) -> Result<RegistrationRequest, RegistrationServiceError> {
        if request.username.trim().is_empty() {
            return Err(RegistrationServiceError::InvalidRequest(
                "Username must not be empty".to_string(),
            ));
        }

        let attestation = request
            .attestation
            .unwrap_or(self.webauthn.settings().attestation);
        let display_name = request
            .display_name
            .as_deref()
            .unwrap_or(&request.username);
        let user_handle = generate_user_handle();

        let options = self.webauthn.start_registration(
            &user_handle,
            &request.username,
            display_name,
            attestation,
            &request.exclude_credentials,
        )?;

        // The store keeps its own copy; the caller's can go to the client
        let request_id = self.store.begin(
            request.username.clone(),
            request.credential_nickname.clone(),
            options.clone(),
        )?;

        info!(
            "Started registration {} for {} (attestation: {attestation})",
            request_id.log_prefix(),
            request.username
        );

        Ok(RegistrationRequest {
            username: request.username,
            credential_nickname: request.credential_nickname,
            request_id,
            public_key_credential_creation_options: options,
        })
    }

    /// Finish a registration ceremony
    ///
    /// The pending registration is consumed before verification, so a request
    /// id cannot be retried even when verification fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request id is unknown, already used, or expired (`Rejected`)
    /// - The client data does not match the issued options
    pub fn finish_registration(
        &self,
        request_id: &str,
        response: &RegistrationResponse,
    ) -> Result<RegisteredCredential, RegistrationServiceError> {
        let pending = self.store.consume(request_id)?;

        if let Err(e) = self
            .webauthn
            .verify_registration_client_data(response, pending.issued_options())
        {
            warn!(
                "Registration {} for {} failed verification: {e}",
                pending.request_id().log_prefix(),
                pending.username()
            );
            return Err(e.into());
        }

        info!(
            "Completed registration {} for {} ({})",
            pending.request_id().log_prefix(),
            pending.username(),
            pending.credential_nickname()
        );

        let username = pending.username().to_string();
        let credential_nickname = pending.credential_nickname().to_string();
        let options = pending.into_options();

        Ok(RegisteredCredential {
            username,
            credential_nickname,
            credential_id: response.id.clone(),
            user_handle: options.user.id,
            attestation: options.attestation,
            attestation_object: response.response.attestation_object.clone(),
            registered_at: Utc::now(),
        })
    }
}
