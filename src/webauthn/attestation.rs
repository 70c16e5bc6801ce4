//! Client data checks for registration responses
//!
//! The authenticator signs over `clientDataJSON`, so before any attestation
//! statement is worth looking at, the client data must name the ceremony type,
//! the challenge we issued, and our origin.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::errors::WebAuthnError;
use super::types::CollectedClientData;

/// Client data type for credential creation
pub const WEBAUTHN_CREATE: &str = "webauthn.create";

/// Decode Base64URL client data JSON into its typed form
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the value is not Base64URL or not
/// valid client data JSON
pub fn decode_client_data(client_data_json_b64: &str) -> Result<CollectedClientData, WebAuthnError> {
    // Browsers differ on padding, so accept it but do not require it
    let trimmed = client_data_json_b64.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|_| WebAuthnError::EncodingError("Invalid client data encoding".to_string()))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| WebAuthnError::EncodingError(format!("Invalid client data JSON: {e}")))
}

/// Verify client data JSON against what was issued
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` for undecodable client data and
/// `WebAuthnError::VerificationFailed` when the type, challenge or origin
/// does not match
pub fn verify_client_data(
    client_data_json_b64: &str,
    expected_type: &str,
    expected_challenge: &str,
    expected_origin: &str,
) -> Result<CollectedClientData, WebAuthnError> {
    let client_data = decode_client_data(client_data_json_b64)?;

    if client_data.r#type != expected_type {
        return Err(WebAuthnError::VerificationFailed(format!(
            "Invalid type, expected {expected_type}"
        )));
    }

    if client_data.challenge != expected_challenge {
        return Err(WebAuthnError::VerificationFailed(
            "Challenge mismatch".to_string(),
        ));
    }

    if client_data.origin != expected_origin {
        return Err(WebAuthnError::VerificationFailed(
            "Origin mismatch".to_string(),
        ));
    }

    Ok(client_data)
}
