//! Source catalog repository. Lookup-only in this pipeline.

use ficherie_core::models::Source;
use ficherie_core::AppError;
use sqlx::{PgPool, Postgres};

/// Repository for the source reference catalog.
#[derive(Clone)]
pub struct SourceRepository {
    pool: PgPool,
}

impl SourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a source catalog entry by its name.
    #[tracing::instrument(skip(self), fields(db.table = "source"))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Source>, AppError> {
        let source: Option<Source> =
            sqlx::query_as::<Postgres, Source>("SELECT id, name FROM source WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(source)
    }
}
