//! Payload-only JWT inspection. The client never verifies signatures; it
//! trusts the decode exactly once, to learn the access token's expiry.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AccessClaims {
    #[serde(default)]
    exp: u64,
}

/// A structurally valid JWT has exactly three dot-separated segments.
pub(crate) fn has_valid_format(token: &str) -> bool {
    !token.is_empty() && token.split('.').count() == 3
}

/// Expiry of the access token in epoch milliseconds, decoded from its `exp`
/// claim. A malformed token decodes as already expired rather than failing.
pub(crate) fn expires_at_millis(token: &str) -> u64 {
    decode_exp_secs(token).map(|exp| exp * 1000).unwrap_or(0)
}

fn decode_exp_secs(token: &str) -> Option<u64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Some(data.claims.exp)
}
