//! Upload repository: lookups and status write-back for the upload table.

use ficherie_core::models::{Upload, UploadStatus};
use ficherie_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for the upload table.
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an upload by id.
    #[tracing::instrument(skip(self), fields(db.table = "upload", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let upload: Option<Upload> = sqlx::query_as::<Postgres, Upload>(
            r#"
            SELECT id, user_id, display_name, type, date, file_name, path, hash, status
            FROM upload WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(upload)
    }

    /// Write an upload's processing status.
    #[tracing::instrument(skip(self), fields(db.table = "upload", db.record_id = %id))]
    pub async fn update_status(&self, id: Uuid, status: UploadStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE upload SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("upload {} does not exist", id)));
        }
        Ok(())
    }
}
