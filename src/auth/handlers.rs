use axum::{
    extract::{multipart::{Field, MultipartRejection}, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{CreateAdminResponse, LicenseUpload, LoginRequest, RegisterForm, TokenResponse, UserResponse},
        extractors::CurrentUser,
        services,
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

const REGISTER_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10MB

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(REGISTER_BODY_LIMIT)),
        )
        .route("/login", post(login))
        .route("/create-admin", post(create_admin))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

async fn field_text(field: Field<'_>) -> AppResult<String> {
    Ok(field.text().await?)
}

/// POST /register (multipart): text fields plus `license_image`.
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UserResponse>> {
    let mut mp = mp?;
    let mut form = RegisterForm::default();
    let mut license: Option<LicenseUpload> = None;

    while let Some(field) = mp.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "email" => form.email = field_text(field).await?,
            "password" => form.password = field_text(field).await?,
            "first_name" => form.first_name = field_text(field).await?,
            "last_name" => form.last_name = field_text(field).await?,
            "phone_number" => form.phone_number = field_text(field).await?,
            "medical_license_number" => form.medical_license_number = field_text(field).await?,
            "license_image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await?;
                license = Some(LicenseUpload {
                    file_name,
                    content_type,
                    body,
                });
            }
            other => warn!(field = other, "ignoring unknown register field"),
        }
    }

    let license = license.ok_or_else(|| AppError::bad_request("license_image is required"))?;
    let user = services::register_doctor(&state, form, license).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = services::login(&state, &payload.email, payload.password).await?;
    Ok(Json(token))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state))]
pub async fn create_admin(State(state): State<AppState>) -> AppResult<Json<CreateAdminResponse>> {
    let admin = services::bootstrap_admin(&state).await?;
    Ok(Json(CreateAdminResponse {
        message: "Admin created successfully".into(),
        email: admin.email,
        password: state.config.admin.password.clone(),
    }))
}
