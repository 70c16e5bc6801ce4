//! Test fixtures providing pre-built test objects
//!
//! These keep integration tests from repeating relying party settings and
//! store wiring.

use std::sync::Arc;
use std::time::Duration;

use crate::registration::{
    ManualClock, RegistrationRequest, RegistrationService, RegistrationSessionStore,
    RegistrationStoreConfig, StartRegistration,
};
use crate::webauthn::{WebAuthnService, WebAuthnSettings};

use super::constants::{TEST_ORIGIN, TEST_RP_ID, TEST_TTL_SECONDS, TEST_USERNAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Relying party settings matching the test origin
    #[must_use]
    pub fn webauthn_settings() -> WebAuthnSettings {
        WebAuthnSettings {
            rp_id: TEST_RP_ID.to_string(),
            rp_name: "Test RP".to_string(),
            rp_origin: TEST_ORIGIN.to_string(),
            ..Default::default()
        }
    }

    /// Store limits with a short lifetime
    #[must_use]
    pub fn store_config(max_pending: usize) -> RegistrationStoreConfig {
        RegistrationStoreConfig {
            ttl: Duration::from_secs(TEST_TTL_SECONDS),
            max_pending,
        }
    }

    /// Store driven by a manual clock, returned alongside it
    #[must_use]
    pub fn store_with_clock<O>(max_pending: usize) -> (Arc<RegistrationSessionStore<O>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(RegistrationSessionStore::with_clock(
            Self::store_config(max_pending),
            clock.clone(),
        ));
        (store, clock)
    }

    /// Registration service on the system clock
    ///
    /// # Panics
    /// Panics if the fixture settings are rejected
    #[must_use]
    pub fn registration_service() -> RegistrationService {
        let store = Arc::new(RegistrationSessionStore::new(Self::store_config(100)));
        Self::registration_service_with_store(store)
    }

    /// Registration service over a caller-supplied store
    ///
    /// # Panics
    /// Panics if the fixture settings are rejected
    #[must_use]
    pub fn registration_service_with_store(
        store: Arc<RegistrationSessionStore>,
    ) -> RegistrationService {
        let webauthn = WebAuthnService::new(Self::webauthn_settings())
            .expect("fixture settings should be valid");
        RegistrationService::new(webauthn, store)
    }

    /// Start a registration for the default test user
    ///
    /// # Panics
    /// Panics if the registration cannot be started
    #[must_use]
    pub fn start(service: &RegistrationService, credential_nickname: &str) -> RegistrationRequest {
        service
            .start_registration(StartRegistration {
                username: TEST_USERNAME.to_string(),
                credential_nickname: credential_nickname.to_string(),
                ..Default::default()
            })
            .expect("registration should start")
    }
}
