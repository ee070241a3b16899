use axum::http::{HeaderMap, header::AUTHORIZATION};
use gymflow_types::{AccessClaims, Role};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

/// Caller identified by a verified bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub claims: AccessClaims,
}

impl CurrentUser {
    /// `Forbidden` unless one of the caller's roles passes `check`.
    pub fn require(&self, check: impl Fn(&Role) -> bool) -> AppResult<()> {
        if self.claims.any_role(check) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.id, roles = ?self.claims.roles, "Role check failed");
            Err(AppError::Forbidden)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.claims.has_role(Role::Admin)
    }
}

pub fn current_user(headers: &HeaderMap, app_state: &AppState) -> AppResult<CurrentUser> {
    let Some(token) = bearer_token(headers) else {
        return Err(AppError::InvalidCredentials);
    };
    let claims = jwt::verify(token, &app_state.config.jwt_secret)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidCredentials)?;
    Ok(CurrentUser { id, claims })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
