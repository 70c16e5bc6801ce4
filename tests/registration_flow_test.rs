// Integration tests for the start/finish registration ceremony
use std::sync::Arc;

use chrono::TimeDelta;
use passkey_registry::registration::RegistrationSessionStore;
use passkey_registry::testing::constants::{TEST_CREDENTIAL_ID, TEST_TTL_SECONDS, TEST_USERNAME};
use passkey_registry::testing::{ManualClock, RegistrationResponseBuilder, TestFixtures};
use passkey_registry::{
    AttestationPreference, RegistrationServiceError, RegistrySettings, StartRegistration,
};

fn service_on_manual_clock() -> (passkey_registry::RegistrationService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(RegistrationSessionStore::with_clock(
        TestFixtures::store_config(100),
        clock.clone(),
    ));
    (TestFixtures::registration_service_with_store(store), clock)
}

#[test]
fn test_two_registrations_for_one_user() {
    let service = TestFixtures::registration_service();

    let phone = TestFixtures::start(&service, "phone");
    let laptop = TestFixtures::start(&service, "laptop");
    assert_ne!(phone.request_id, laptop.request_id);
    assert_ne!(
        phone.public_key_credential_creation_options.challenge,
        laptop.public_key_credential_creation_options.challenge
    );

    let credential = service
        .finish_registration(
            phone.request_id.as_str(),
            &RegistrationResponseBuilder::for_request(&phone).build(),
        )
        .expect("phone registration should finish");
    assert_eq!(credential.username, TEST_USERNAME);
    assert_eq!(credential.credential_nickname, "phone");
    assert_eq!(credential.credential_id, TEST_CREDENTIAL_ID);

    // Replaying the same response is rejected
    assert_eq!(
        service
            .finish_registration(
                phone.request_id.as_str(),
                &RegistrationResponseBuilder::for_request(&phone).build(),
            )
            .unwrap_err(),
        RegistrationServiceError::Rejected
    );

    // The other attempt is unaffected
    let credential = service
        .finish_registration(
            laptop.request_id.as_str(),
            &RegistrationResponseBuilder::for_request(&laptop).build(),
        )
        .expect("laptop registration should finish");
    assert_eq!(credential.credential_nickname, "laptop");
}

#[test]
fn test_cross_request_challenge_is_rejected() {
    let service = TestFixtures::registration_service();
    let first = TestFixtures::start(&service, "first");
    let second = TestFixtures::start(&service, "second");

    // Answer the second request with the first request's challenge
    let response = RegistrationResponseBuilder::for_request(&first).build();
    assert!(matches!(
        service.finish_registration(second.request_id.as_str(), &response),
        Err(RegistrationServiceError::VerificationFailed(_))
    ));

    // The first is still pending and can complete normally
    assert!(service
        .finish_registration(first.request_id.as_str(), &response)
        .is_ok());
}

#[test]
fn test_wrong_origin_and_type_fail_verification() {
    let service = TestFixtures::registration_service();

    let request = TestFixtures::start(&service, "phone");
    let response = RegistrationResponseBuilder::for_request(&request)
        .with_origin("https://phish.example")
        .build();
    assert!(matches!(
        service.finish_registration(request.request_id.as_str(), &response),
        Err(RegistrationServiceError::VerificationFailed(_))
    ));

    let request = TestFixtures::start(&service, "phone");
    let response = RegistrationResponseBuilder::for_request(&request)
        .with_client_data_type("webauthn.get")
        .build();
    assert!(matches!(
        service.finish_registration(request.request_id.as_str(), &response),
        Err(RegistrationServiceError::VerificationFailed(_))
    ));
}

#[test]
fn test_expired_and_unknown_look_identical() {
    let (service, clock) = service_on_manual_clock();
    let request = TestFixtures::start(&service, "phone");
    let response = RegistrationResponseBuilder::for_request(&request).build();

    clock.advance(TimeDelta::seconds(i64::try_from(TEST_TTL_SECONDS).unwrap() + 1));

    let expired = service
        .finish_registration(request.request_id.as_str(), &response)
        .unwrap_err();
    let unknown = service
        .finish_registration("never-issued", &response)
        .unwrap_err();

    assert_eq!(expired, unknown);
    assert_eq!(expired.to_string(), unknown.to_string());

    // Internally the two are still told apart
    let metrics = service.store().metrics();
    assert_eq!(metrics.expired, 1);
    assert_eq!(metrics.unknown, 1);
}

#[test]
fn test_request_serializes_for_the_client() {
    let service = TestFixtures::registration_service();
    let request = service
        .start_registration(StartRegistration {
            username: "bob".to_string(),
            display_name: Some("Bob B.".to_string()),
            credential_nickname: "yubikey".to_string(),
            attestation: Some(AttestationPreference::Direct),
            exclude_credentials: vec!["existing".to_string()],
        })
        .unwrap();

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["username"], "bob");
    assert_eq!(json["credentialNickname"], "yubikey");
    assert_eq!(json["requestId"], request.request_id.as_str());

    let options = &json["publicKeyCredentialCreationOptions"];
    assert_eq!(options["attestation"], "direct");
    assert_eq!(options["user"]["displayName"], "Bob B.");
    assert_eq!(options["rp"]["id"], "example.com");
    assert_eq!(options["excludeCredentials"][0]["id"], "existing");
}

#[test]
fn test_service_from_default_settings() {
    let settings = RegistrySettings::default();
    let service = passkey_registry::RegistrationService::from_settings(&settings).unwrap();
    assert_eq!(service.store().config(), settings.registration.store_config());
    assert_eq!(
        service.webauthn().settings().attestation,
        AttestationPreference::None
    );
}
