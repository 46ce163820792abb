use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{dto::MessageResponse, extractors::ApprovedUser},
    error::AppResult,
    extract::{AppJson, AppQuery},
    shifts::{
        dto::{CreateShiftRequest, ShiftQuery},
        repo_types::Shift,
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/shifts", get(list_shifts))
        .route("/my-shifts", get(my_shifts))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/shifts", axum::routing::post(create_shift))
        .route("/shifts/:id", delete(delete_shift))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_shifts(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppQuery(q): AppQuery<ShiftQuery>,
) -> AppResult<Json<Vec<Shift>>> {
    let filter = services::filter_from_query(q)?;
    let shifts = state.shifts.list_active(&filter).await?;
    Ok(Json(shifts))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_shifts(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
) -> AppResult<Json<Vec<Shift>>> {
    Ok(Json(state.shifts.list_by_doctor(user.id).await?))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_shift(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppJson(body): AppJson<CreateShiftRequest>,
) -> AppResult<Json<Shift>> {
    let shift = services::create_shift(&state, &user, body).await?;
    Ok(Json(shift))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_shift(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_shift(&state, &user, &id).await?;
    Ok(Json(MessageResponse::new("Shift deleted successfully")))
}
