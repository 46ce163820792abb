use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{ApprovalStatus, NewUser, User, UserRole};
use crate::db::MAX_LIST_ROWS;
use crate::error::RepoError;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, phone_number,
    medical_license_number, role, approval_status, license_image_path,
    created_at, approved_at, approved_by
"#;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    /// Fails with [`RepoError::DuplicateEmail`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    async fn any_with_role(&self, role: UserRole) -> Result<bool, RepoError>;
    /// Oldest first.
    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, RepoError>;
    /// Returns `false` when no user has this id.
    async fn set_approval(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        approver: Option<Uuid>,
    ) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let approved_at =
            (user.approval_status == ApprovalStatus::Approved).then(OffsetDateTime::now_utc);
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone_number,
                               medical_license_number, role, approval_status,
                               license_image_path, approved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.medical_license_number)
        .bind(user.role)
        .bind(user.approval_status)
        .bind(&user.license_image_path)
        .bind(approved_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::DuplicateEmail
            } else {
                RepoError::Database(e)
            }
        })
    }

    async fn any_with_role(&self, role: UserRole) -> Result<bool, RepoError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
                .bind(role)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, RepoError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE approval_status = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#
        ))
        .bind(status)
        .bind(MAX_LIST_ROWS)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn set_approval(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        approver: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let result = match (status, approver) {
            (ApprovalStatus::Approved, Some(admin_id)) => {
                sqlx::query(
                    r#"
                    UPDATE users
                       SET approval_status = $2, approved_at = now(), approved_by = $3
                     WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(status)
                .bind(admin_id)
                .execute(&self.db)
                .await?
            }
            _ => {
                sqlx::query("UPDATE users SET approval_status = $2 WHERE id = $1")
                    .bind(id)
                    .bind(status)
                    .execute(&self.db)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }
}
