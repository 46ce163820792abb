use anyhow::Context;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LicenseUpload, RegisterForm, TokenResponse, UserResponse},
        jwt::JwtKeys,
        password::{hash_blocking, verify_blocking},
        repo_types::{ApprovalStatus, NewUser, User, UserRole},
    },
    error::{AppError, AppResult, RepoError},
    images::services::store_license_image,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_form(form: &RegisterForm) -> AppResult<()> {
    let required = [
        ("email", &form.email),
        ("password", &form.password),
        ("first_name", &form.first_name),
        ("last_name", &form.last_name),
        ("phone_number", &form.phone_number),
        ("medical_license_number", &form.medical_license_number),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    if !is_valid_email(&form.email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password too short"));
    }
    Ok(())
}

/// Creates a pending doctor account; the image is stored before the record
/// and removed again if the insert fails.
pub async fn register_doctor(
    state: &AppState,
    mut form: RegisterForm,
    license: LicenseUpload,
) -> AppResult<UserResponse> {
    form.email = normalize_email(&form.email);
    validate_form(&form)?;

    if state.users.find_by_email(&form.email).await?.is_some() {
        warn!(email = %form.email, "email already registered");
        return Err(RepoError::DuplicateEmail.into());
    }

    let image = store_license_image(state.storage.as_ref(), license).await?;
    let password_hash = hash_blocking(form.password).await?;

    let new_user = NewUser {
        email: form.email,
        password_hash,
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone_number: form.phone_number.trim().to_string(),
        medical_license_number: form.medical_license_number.trim().to_string(),
        role: UserRole::Doctor,
        approval_status: ApprovalStatus::Pending,
        license_image_path: Some(image.public_path.clone()),
    };

    let user = match state.users.create(new_user).await {
        Ok(u) => u,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_object(&image.key).await {
                error!(error = %cleanup, key = %image.key, "orphaned license image");
            }
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user.into())
}

pub async fn login(state: &AppState, email: &str, password: String) -> AppResult<TokenResponse> {
    let email = normalize_email(email);
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user: User = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(invalid());
        }
    };

    let ok = verify_blocking(password, user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let access_token = JwtKeys::from_ref(state)
        .sign(user.id)
        .context("jwt sign")?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        user: user.into(),
    })
}

/// Creates the first admin from configured credentials; refuses if any admin exists.
pub async fn bootstrap_admin(state: &AppState) -> AppResult<User> {
    if state.users.any_with_role(UserRole::Admin).await? {
        warn!("create-admin called but an admin already exists");
        return Err(AppError::bad_request("Admin already exists"));
    }

    let creds = &state.config.admin;
    let password_hash = hash_blocking(creds.password.clone()).await?;
    let admin = state
        .users
        .create(NewUser {
            email: normalize_email(&creds.email),
            password_hash,
            first_name: "Admin".into(),
            last_name: "System".into(),
            phone_number: "0000000000".into(),
            medical_license_number: "ADMIN001".into(),
            role: UserRole::Admin,
            approval_status: ApprovalStatus::Approved,
            license_image_path: None,
        })
        .await?;

    info!(user_id = %admin.id, email = %admin.email, "admin created");
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use uuid::Uuid;

    use super::*;
    use crate::auth::repo::UserRepo;
    use crate::testing::{test_config, FakeStorage, MemoryShiftRepo};

    /// Sees no user on lookup but loses the insert, as when two
    /// registrations for one email interleave.
    struct RacingUserRepo;

    #[async_trait]
    impl UserRepo for RacingUserRepo {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
            Ok(None)
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
            Ok(None)
        }
        async fn create(&self, _user: NewUser) -> Result<User, RepoError> {
            Err(RepoError::DuplicateEmail)
        }
        async fn any_with_role(&self, _role: UserRole) -> Result<bool, RepoError> {
            Ok(false)
        }
        async fn list_by_status(&self, _status: ApprovalStatus) -> Result<Vec<User>, RepoError> {
            Ok(Vec::new())
        }
        async fn set_approval(
            &self,
            _id: Uuid,
            _status: ApprovalStatus,
            _approver: Option<Uuid>,
        ) -> Result<bool, RepoError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn lost_insert_race_is_400_and_removes_image() {
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::from_parts(
            Arc::new(test_config()),
            Arc::new(RacingUserRepo),
            Arc::new(MemoryShiftRepo::default()),
            storage.clone(),
        );
        let license = LicenseUpload {
            file_name: Some("card.png".into()),
            content_type: "image/png".into(),
            body: bytes::Bytes::from_static(b"\x89PNG"),
        };

        let err = register_doctor(&state, form(), license).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Email already registered");
        assert!(storage.is_empty());
    }

    fn form() -> RegisterForm {
        RegisterForm {
            email: "doc@example.com".into(),
            password: "password123".into(),
            first_name: "Somchai".into(),
            last_name: "Jaidee".into(),
            phone_number: "0812345678".into(),
            medical_license_number: "MD12345".into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("doc@example.com"));
        assert!(!is_valid_email("doc@example"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Doc@Example.COM "), "doc@example.com");
    }

    #[test]
    fn form_validation() {
        assert!(validate_form(&form()).is_ok());

        let mut f = form();
        f.password = "short".into();
        assert_eq!(validate_form(&f).unwrap_err().to_string(), "Password too short");

        let mut f = form();
        f.last_name = "  ".into();
        assert_eq!(validate_form(&f).unwrap_err().to_string(), "last_name is required");

        let mut f = form();
        f.email = "nope".into();
        assert_eq!(validate_form(&f).unwrap_err().to_string(), "Invalid email");

        let mut f = form();
        f.password = String::new();
        assert_eq!(validate_form(&f).unwrap_err().to_string(), "password is required");
    }
}
