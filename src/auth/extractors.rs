use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{error, warn};

use crate::{
    auth::{jwt::JwtKeys, repo_types::User},
    error::AppError,
    state::AppState,
};

/// Any authenticated user, loaded fresh from the store.
pub struct CurrentUser(pub User);

/// Authenticated user whose account has been approved.
pub struct ApprovedUser(pub User);

/// Approved user with the admin role.
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            warn!("missing or malformed Authorization header");
            AppError::credentials()
        })?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::credentials()
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %claims.sub, "user lookup failed");
                AppError::from(e)
            })?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                AppError::credentials()
            })?;

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ApprovedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_approved() {
            warn!(user_id = %user.id, status = ?user.approval_status, "user not approved");
            return Err(AppError::Forbidden("User not approved yet".into()));
        }
        Ok(ApprovedUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            warn!(user_id = %user.id, role = ?user.role, "admin access denied");
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
