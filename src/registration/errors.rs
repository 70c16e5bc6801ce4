//! Registration store errors

/// Message shown to callers for any request that cannot be completed
pub const GENERIC_REJECTION: &str = "No such registration in progress";

/// Errors from the pending registration store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Never issued, already consumed, or evicted
    #[error("Unknown registration request")]
    UnknownRequest,

    /// Found, but past its expiry; removed as a side effect
    #[error("Registration request expired")]
    Expired,

    /// Store is holding its maximum number of live registrations
    #[error("Too many registrations in progress (limit {max_pending})")]
    CapacityExceeded { max_pending: usize },

    /// No unused identifier could be produced
    #[error("Failed to generate request identifier: {0}")]
    IdentifierGeneration(String),
}

impl RegistrationError {
    /// Whether this should be reported to the caller as a plain rejection
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnknownRequest | Self::Expired)
    }

    /// Caller-facing message; unknown and expired requests read the same
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_rejection() {
            GENERIC_REJECTION.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_expired_look_the_same() {
        assert!(RegistrationError::UnknownRequest.is_rejection());
        assert!(RegistrationError::Expired.is_rejection());
        assert_eq!(
            RegistrationError::UnknownRequest.public_message(),
            RegistrationError::Expired.public_message()
        );
        assert_ne!(
            RegistrationError::UnknownRequest.to_string(),
            RegistrationError::Expired.to_string()
        );
    }

    #[test]
    fn test_capacity_is_not_a_rejection() {
        let err = RegistrationError::CapacityExceeded { max_pending: 3 };
        assert!(!err.is_rejection());
        assert!(err.public_message().contains('3'));
    }
}
