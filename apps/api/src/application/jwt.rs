use gymflow_types::AccessClaims;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};

use crate::app_error::{AppError, AppResult};

#[cfg(test)]
use gymflow_types::Role;
#[cfg(test)]
use jsonwebtoken::{EncodingKey, Header, encode};
#[cfg(test)]
use time::{Duration, OffsetDateTime};
#[cfg(test)]
use uuid::Uuid;

/// Issue an HS256 access token signed with `secret`. Production tokens come
/// from the identity service, so this only exists for tests.
#[cfg(test)]
pub fn issue(
    user_id: Uuid,
    roles: Vec<Role>,
    secret: &SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        roles,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify(token: &str, secret: &SecretString) -> AppResult<AccessClaims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::InvalidCredentials
    })
}
