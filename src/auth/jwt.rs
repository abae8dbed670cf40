/// JWT Token Generation and Validation
///
/// Both token families are HS256 JWTs; they differ in claims, lifetime and
/// signing secret.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::User;

/// Seconds of clock skew tolerated on `exp`
const LEEWAY_SECONDS: u64 = 5;

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn verify<T: DeserializeOwned>(
    token: &str,
    secret: &str,
    issuer: &str,
) -> Result<T, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = LEEWAY_SECONDS;
    validation.set_issuer(&[issuer]);

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Generate a new access token for a user
pub fn generate_access_token(user: &User, config: &JwtSettings) -> Result<String, AppError> {
    let claims = AccessClaims::new(user, config.access_token_expiry, config.issuer.clone());
    sign(&claims, &config.access_token_secret)
}

/// Validate an access token against the access secret
///
/// # Errors
/// Every failure (expired, malformed, bad signature, wrong issuer) is
/// reported as `AuthError::InvalidAccessToken` with the cause attached.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<AccessClaims, AppError> {
    verify::<AccessClaims>(token, &config.access_token_secret, &config.issuer)
        .map_err(|e| AuthError::InvalidAccessToken(e.to_string()).into())
}

/// Generate a new refresh token for a user
pub fn generate_refresh_token(user_id: Uuid, config: &JwtSettings) -> Result<String, AppError> {
    let claims = RefreshClaims::new(user_id, config.refresh_token_expiry, config.issuer.clone());
    sign(&claims, &config.refresh_token_secret)
}

/// Validate a refresh token against the refresh secret
pub fn validate_refresh_token(
    token: &str,
    config: &JwtSettings,
) -> Result<RefreshClaims, AppError> {
    verify::<RefreshClaims>(token, &config.refresh_token_secret, &config.issuer)
        .map_err(|e| AuthError::InvalidRefreshToken(e.to_string()).into())
}
