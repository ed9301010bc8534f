//! Fiche repository: dedup lookups and transactional inserts.

use ficherie_core::models::{Fiche, NewFiche};
use ficherie_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Repository for the fiche table. Fiches are insert-only; rows are written
/// exclusively inside the per-record commit transaction.
#[derive(Clone)]
pub struct FicheRepository {
    pool: PgPool,
}

impl FicheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a fiche by its primary document's content hash.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_hash(&self, hash: &str) -> Result<Option<Fiche>, AppError> {
        let fiche: Option<Fiche> = sqlx::query_as::<Postgres, Fiche>(
            r#"
            SELECT id, reference, source_id, object, summary, date, hash, path, upload_id, dump
            FROM fiche WHERE hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fiche)
    }

    /// Whether a fiche with this content hash has already been committed.
    pub async fn hash_exists(&self, hash: &str) -> Result<bool, AppError> {
        Ok(self.get_by_hash(hash).await?.is_some())
    }

    /// Insert a fiche row within the record's transaction, returning the
    /// generated id.
    #[tracing::instrument(skip(self, tx, fiche), fields(db.table = "fiche", reference = %fiche.reference))]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fiche: &NewFiche,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO fiche (id, reference, source_id, object, summary, date, hash, path, upload_id, dump)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&fiche.reference)
        .bind(fiche.source_id)
        .bind(&fiche.object)
        .bind(&fiche.summary)
        .bind(fiche.date)
        .bind(&fiche.hash)
        .bind(&fiche.path)
        .bind(fiche.upload_id)
        .bind(&fiche.dump)
        .execute(&mut **tx)
        .await?;
        Ok(id)
    }
}
