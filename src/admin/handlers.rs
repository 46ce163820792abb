use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{MessageResponse, UserResponse},
        extractors::AdminUser,
        repo_types::ApprovalStatus,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pending-users", get(pending_users))
        .route("/admin/approve-user/:id", post(approve_user))
        .route("/admin/reject-user/:id", post(reject_user))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn pending_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.users.list_by_status(ApprovalStatus::Pending).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    set_status(&state, &id, ApprovalStatus::Approved, Some(admin.id)).await?;
    Ok(Json(MessageResponse::new("User approved successfully")))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reject_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    set_status(&state, &id, ApprovalStatus::Rejected, None).await?;
    Ok(Json(MessageResponse::new("User rejected")))
}

async fn set_status(
    state: &AppState,
    raw_id: &str,
    status: ApprovalStatus,
    approver: Option<Uuid>,
) -> AppResult<()> {
    let not_found = || AppError::not_found("User not found");
    let user_id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;

    if !state.users.set_approval(user_id, status, approver).await? {
        warn!(%user_id, ?status, "approval change for unknown user");
        return Err(not_found());
    }
    info!(%user_id, ?status, "approval status changed");
    Ok(())
}
