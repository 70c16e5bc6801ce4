//! Registration ceremony state
//!
//! This module correlates the credential creation options a relying party
//! issued with the client's eventual response. Each issued request can be
//! consumed once, within its lifetime; abandoned requests are swept away.

mod clock;
mod errors;
mod metrics;
mod pending;
mod service;
mod store;
mod sweeper;
mod types;

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use errors::{RegistrationError, GENERIC_REJECTION};
pub use metrics::StoreMetricsSnapshot;
pub use pending::{PendingRegistration, RequestId};
pub use service::{RegistrationService, RegistrationServiceError};
pub use store::{
    RegistrationSessionStore, RegistrationStoreConfig, RequestIdSource, DEFAULT_MAX_PENDING,
    DEFAULT_TTL,
};
pub use sweeper::spawn_expiry_sweeper;
pub use types::{RegisteredCredential, RegistrationRequest, StartRegistration};
