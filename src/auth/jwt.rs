/// Token issuance and verification
///
/// HS256-signed tokens over the claim set. Verification recomputes the
/// signature and rejects anything tampered with or signed by another key.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::ApiError;

/// Sign a claim set into an opaque bearer token.
pub fn issue_token(claims: &Claims, config: &JwtSettings) -> Result<String, ApiError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token issuance failed: {}", e)))
}

/// Decode a token and check its signature.
///
/// Tokens carry no `exp` claim, so the library's default expiry checks are
/// disabled; signature and payload integrity are still mandatory.
pub fn verify_token(token: &str, config: &JwtSettings) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = std::collections::HashSet::new();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::InvalidToken
    })
}
