use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub medical_license_number: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub license_image_path: Option<String>,
    pub created_at: OffsetDateTime,
    pub approved_at: Option<OffsetDateTime>,
    pub approved_by: Option<Uuid>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin && self.is_approved()
    }
}

/// Everything needed to insert a user; ids and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub medical_license_number: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub license_image_path: Option<String>,
}

#[cfg(test)]
impl NewUser {
    pub fn into_user(self, id: Uuid, now: OffsetDateTime) -> User {
        let approved_at = (self.approval_status == ApprovalStatus::Approved).then_some(now);
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            medical_license_number: self.medical_license_number,
            role: self.role,
            approval_status: self.approval_status,
            license_image_path: self.license_image_path,
            created_at: now,
            approved_at,
            approved_by: None,
        }
    }
}
