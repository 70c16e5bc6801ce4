//! `WebAuthn` error types
//!
//! This module defines custom error types for `WebAuthn` operations.

use std::fmt;

/// `WebAuthn` errors that can occur during operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebAuthnError {
    /// Configuration error (e.g., invalid settings)
    ConfigurationError(String),

    /// Verification failed (e.g., challenge, type, or origin)
    VerificationFailed(String),

    /// Data encoding/parsing error
    EncodingError(String),

    /// Randomness source or other internal failure
    InternalError(String),
}

impl fmt::Display for WebAuthnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebAuthnError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            WebAuthnError::VerificationFailed(msg) => write!(f, "Verification failed: {msg}"),
            WebAuthnError::EncodingError(msg) => write!(f, "Encoding error: {msg}"),
            WebAuthnError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for WebAuthnError {}
