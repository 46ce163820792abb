use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{ApprovalStatus, User, UserRole};

/// Text fields of the multipart registration form.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub medical_license_number: String,
}

/// License image part of the registration form.
#[derive(Debug)]
pub struct LicenseUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: bytes::Bytes,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub medical_license_number: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub license_image_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            medical_license_number: u.medical_license_number,
            role: u.role,
            approval_status: u.approval_status,
            license_image_path: u.license_image_path,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAdminResponse {
    pub message: String,
    pub email: String,
    pub password: String,
}
