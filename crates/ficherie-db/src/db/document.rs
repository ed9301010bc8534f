//! Document repository: dedup lookups and transactional inserts.

use ficherie_core::models::{Document, NewDocument};
use ficherie_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Repository for the document table. Documents are only ever written as
/// part of their parent fiche's transaction.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a document by its content hash.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_hash(&self, hash: &str) -> Result<Option<Document>, AppError> {
        let document: Option<Document> = sqlx::query_as::<Postgres, Document>(
            r#"
            SELECT id, fiche_id, type, name, path, hash, content, metadata,
                   original_name, original_path, original_hash
            FROM document WHERE hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    /// Whether a document with this content hash has already been committed.
    pub async fn hash_exists(&self, hash: &str) -> Result<bool, AppError> {
        Ok(self.get_by_hash(hash).await?.is_some())
    }

    /// Insert a document row within its fiche's transaction.
    #[tracing::instrument(skip(self, tx, document), fields(db.table = "document", name = %document.name))]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fiche_id: Uuid,
        document: &NewDocument,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO document
                (id, fiche_id, type, name, path, hash, content, metadata,
                 original_name, original_path, original_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(fiche_id)
        .bind(document.doc_type)
        .bind(&document.name)
        .bind(&document.path)
        .bind(&document.hash)
        .bind(&document.content)
        .bind(&document.metadata)
        .bind(&document.original_name)
        .bind(&document.original_path)
        .bind(&document.original_hash)
        .execute(&mut **tx)
        .await?;
        Ok(id)
    }
}
