use crate::error::{AppError, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a session token. Session issuance lives in the external
/// identity service; this core only verifies tokens and reads the caller's
/// identity out of them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub exp: u64,
}

/// Verifies a bearer token and returns its claims.
///
/// # Errors
/// Returns `AppError::Unauthenticated` if the token is invalid or expired.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated)?;

    Ok(data.claims)
}

/// Issues a token for the given user. Used by the test suites and local
/// tooling; production tokens come from the identity service.
///
/// # Errors
/// Returns `AppError::Internal` if signing fails.
pub fn issue_token(user_id: Uuid, name: &str, secret: &str, ttl_secs: u64) -> Result<String> {
    let exp = u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(0) + ttl_secs;
    let claims = Claims { sub: user_id, name: name.to_string(), exp };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|_| AppError::Internal)
}
