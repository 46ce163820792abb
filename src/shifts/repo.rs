use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::MAX_LIST_ROWS;
use crate::error::RepoError;
use crate::shifts::repo_types::{NewShift, Shift, ShiftFilter};

const SHIFT_COLUMNS: &str = r#"
    id, doctor_id, doctor_name, position, shift_date, start_time, end_time,
    hospital_name, location, compensation, description, requirements,
    contact_method, created_at, is_active
"#;

#[async_trait]
pub trait ShiftRepo: Send + Sync {
    async fn create(&self, shift: NewShift) -> Result<Shift, RepoError>;
    /// Active shifts matching `filter`, earliest `shift_date` first.
    async fn list_active(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepoError>;
    /// Every shift posted by `doctor_id`, newest first.
    async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Shift>, RepoError>;
    /// Soft delete. `false` if the shift does not exist or belongs to someone else.
    async fn deactivate(&self, shift_id: Uuid, doctor_id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgShiftRepo {
    db: PgPool,
}

impl PgShiftRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE wildcards so user input is matched literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn filtered_query(filter: &ShiftFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts WHERE is_active = TRUE"
    ));
    if let Some(position) = filter.position {
        qb.push(" AND position = ").push_bind(position);
    }
    if let Some(location) = filter.location.as_deref() {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND shift_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND shift_date <= ").push_bind(to);
    }
    qb.push(" ORDER BY shift_date ASC, start_time ASC, created_at ASC LIMIT ")
        .push_bind(MAX_LIST_ROWS);
    qb
}

#[async_trait]
impl ShiftRepo for PgShiftRepo {
    async fn create(&self, shift: NewShift) -> Result<Shift, RepoError> {
        let row = sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (id, doctor_id, doctor_name, position, shift_date, start_time,
                                end_time, hospital_name, location, compensation, description,
                                requirements, contact_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(shift.doctor_id)
        .bind(&shift.doctor_name)
        .bind(shift.position)
        .bind(shift.shift_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(&shift.hospital_name)
        .bind(&shift.location)
        .bind(shift.compensation)
        .bind(&shift.description)
        .bind(&shift.requirements)
        .bind(&shift.contact_method)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_active(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepoError> {
        let rows = filtered_query(filter)
            .build_query_as::<Shift>()
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Shift>, RepoError> {
        let rows = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE doctor_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(doctor_id)
        .bind(MAX_LIST_ROWS)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn deactivate(&self, shift_id: Uuid, doctor_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE shifts SET is_active = FALSE WHERE id = $1 AND doctor_id = $2",
        )
        .bind(shift_id)
        .bind(doctor_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
