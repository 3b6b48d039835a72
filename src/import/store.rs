use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use super::error::StoreError;
use super::reconcile::AttendanceStore;
use crate::model::attendance::{AttendancePatch, NewAttendance};
use crate::model::employee::DirectoryEmployee;
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

/// Active employees, the only identities an import may resolve to.
pub async fn load_active_directory(
    pool: &MySqlPool,
) -> Result<Vec<DirectoryEmployee>, sqlx::Error> {
    sqlx::query_as::<_, DirectoryEmployee>(
        r#"
        SELECT id, employee_code, first_name, last_name
        FROM employees
        WHERE status = 'active'
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_row(&self, id: u64) -> Result<Option<u64>, sqlx::Error> {
        sqlx::query_scalar::<_, u64>("SELECT id FROM attendance WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

/// Columns written for a patch; absent punches leave the stored value alone.
fn patch_fields(patch: &AttendancePatch) -> Vec<(&'static str, SqlValue)> {
    let mut fields = vec![("status", SqlValue::String(patch.status.to_string()))];
    if let Some(check_in) = patch.check_in {
        fields.push(("check_in", SqlValue::DateTime(check_in)));
    }
    if let Some(check_out) = patch.check_out {
        fields.push(("check_out", SqlValue::DateTime(check_out)));
    }
    if let Some(notes) = &patch.notes {
        fields.push(("notes", SqlValue::String(notes.clone())));
    }
    fields
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_id(&self, employee_id: u64, date: NaiveDate) -> Result<Option<u64>, StoreError> {
        let id = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM attendance WHERE employee_id = ? AND date = ? LIMIT 1",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError> {
        let update = build_update_sql("attendance", patch_fields(patch), "id", id)?;
        let affected = execute_update(&self.pool, update).await?;

        // MySQL reports 0 when the row already held these values; only a
        // missing row is a failure.
        if affected == 0 && self.find_row(id).await?.is_none() {
            return Err(StoreError::Rejected(format!("attendance {} no longer exists", id)));
        }
        Ok(())
    }

    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (employee_id, date, status, check_in, check_out, notes, work_type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.status.to_string())
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.notes.as_deref())
        .bind(record.work_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }
}
