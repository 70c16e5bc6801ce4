//! Testing utilities for passkey-registry
//!
//! - [`fixtures`] - Pre-built test data (settings, services, stores)
//! - [`builders`] - Fluent builders for client registration responses
//!
//! ## Usage
//!
//! ```rust
//! use passkey_registry::testing::{builders::RegistrationResponseBuilder, fixtures::TestFixtures};
//!
//! let service = TestFixtures::registration_service();
//! let request = TestFixtures::start(&service, "phone");
//! let response = RegistrationResponseBuilder::for_request(&request).build();
//! assert!(service
//!     .finish_registration(request.request_id.as_str(), &response)
//!     .is_ok());
//! ```

pub mod builders;
pub mod fixtures;

pub use crate::registration::ManualClock;
pub use builders::RegistrationResponseBuilder;
pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Relying party id used by fixtures
    pub const TEST_RP_ID: &str = "example.com";

    /// Origin the fixture relying party expects in client data
    pub const TEST_ORIGIN: &str = "https://example.com";

    /// Default test username
    pub const TEST_USERNAME: &str = "alice";

    /// Default test credential id
    pub const TEST_CREDENTIAL_ID: &str = "dGVzdC1jcmVkZW50aWFs";

    /// `{"fmt":"none"}` as Base64URL CBOR, enough for pass-through tests
    pub const TEST_ATTESTATION_OBJECT: &str = "oWNmbXRkbm9uZQ";

    /// Store lifetime used by fixtures, in seconds
    pub const TEST_TTL_SECONDS: u64 = 60;
}
