//! Pending registration records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, unguessable identifier for one registration attempt
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in log lines
    #[must_use]
    pub fn log_prefix(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for RequestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keep full identifiers out of debug output
impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({}…)", self.log_prefix())
    }
}

/// One in-flight registration attempt
///
/// Built once by the store and never changed; consuming it hands ownership of
/// the issued options to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration<O> {
    request_id: RequestId,
    username: String,
    credential_nickname: String,
    issued_options: O,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<O> PendingRegistration<O> {
    pub(crate) fn new(
        request_id: RequestId,
        username: String,
        credential_nickname: String,
        issued_options: O,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id,
            username,
            credential_nickname,
            issued_options,
            issued_at,
            expires_at,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn credential_nickname(&self) -> &str {
        &self.credential_nickname
    }

    #[must_use]
    pub fn issued_options(&self) -> &O {
        &self.issued_options
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// An entry is live strictly before `expires_at`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn into_options(self) -> O {
        self.issued_options
    }
}
