//! Bearer-token identity extraction
//!
//! The host forwards a short-lived bearer token whose claims are trusted at
//! face value: the payload segment is decoded without signature verification
//! solely to pull out a username-like claim.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Claim names tried in priority order
const USERNAME_CLAIMS: [&str; 3] = ["username", "user_name", "preferred_username"];

/// Errors raised while decoding a bearer token
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has no payload segment")]
    MissingPayload,

    #[error("Payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a JWT-shaped token's payload segment into its claims.
///
/// No signature verification is performed.
pub fn decode_claims(token: &str) -> Result<Value, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::MissingPayload)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Return the first populated username-like claim, or the empty string.
///
/// Priority order: `username`, `user_name`, `preferred_username`.
pub fn username_from_claims(claims: &Value) -> String {
    for claim in USERNAME_CLAIMS {
        if let Some(name) = claims.get(claim).and_then(|v| v.as_str()) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    String::new()
}

/// Decode a token and extract the username in one step
pub fn username_from_token(token: &str) -> Result<String, TokenError> {
    Ok(username_from_claims(&decode_claims(token)?))
}
