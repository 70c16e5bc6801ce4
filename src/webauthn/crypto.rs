//! Secure random values for `WebAuthn` ceremonies
//!
//! Challenges and registration request identifiers both come from the
//! operating system CSPRNG and are transported as unpadded Base64URL.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};

use super::errors::WebAuthnError;

/// Challenge length in bytes (256 bits)
pub const CHALLENGE_LEN: usize = 32;

/// Registration request identifier length in bytes (256 bits)
pub const REQUEST_ID_LEN: usize = 32;

/// Fill `N` bytes from the system CSPRNG and encode them
///
/// # Errors
/// Returns `WebAuthnError::InternalError` if the system random source fails
pub fn random_token<const N: usize>() -> Result<String, WebAuthnError> {
    let mut bytes = [0u8; N];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| WebAuthnError::InternalError("System random source unavailable".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate a secure random challenge
///
/// # Errors
/// Returns `WebAuthnError::InternalError` if the system random source fails
pub fn generate_challenge() -> Result<String, WebAuthnError> {
    random_token::<CHALLENGE_LEN>()
}

/// Generate an unguessable registration request identifier
///
/// # Errors
/// Returns `WebAuthnError::InternalError` if the system random source fails
pub fn generate_request_id() -> Result<String, WebAuthnError> {
    random_token::<REQUEST_ID_LEN>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_challenge_encodes_32_bytes() {
        let challenge = generate_challenge().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(&challenge).unwrap();
        assert_eq!(decoded.len(), CHALLENGE_LEN);
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_request_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_request_id().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
