//! Per-record persistence.
//!
//! One transaction per validated record: the fiche row, its document rows,
//! and the physical relocation of the record's files into permanent
//! storage. The file copies happen after the inserts but before the commit,
//! so the commit itself is the only step that can leave the database and
//! the filesystem diverged; when it fails, the copies are removed again and
//! the error says so. A failed commit is always surfaced to the per-record
//! loop, never swallowed.

use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use ficherie_core::AppError;
use ficherie_db::{DocumentRepository, FicheRepository, TransactionGuard};

use crate::validate::NormalizedRecord;

pub struct RecordCommitter {
    pool: PgPool,
    fiches: FicheRepository,
    documents: DocumentRepository,
    storage_root: PathBuf,
}

impl RecordCommitter {
    pub fn new(pool: PgPool, storage_root: PathBuf) -> Self {
        Self {
            fiches: FicheRepository::new(pool.clone()),
            documents: DocumentRepository::new(pool.clone()),
            pool,
            storage_root,
        }
    }

    /// Commit one normalized record, returning the new fiche id.
    ///
    /// Rolls back entirely on any failure: no row of a failed record
    /// survives, and relocated files are removed again best-effort.
    #[tracing::instrument(skip(self, record), fields(reference = %record.fiche.reference))]
    pub async fn commit(&self, record: &NormalizedRecord) -> Result<Uuid, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let fiche_id = match self.fiches.insert_tx(&mut tx, &record.fiche).await {
            Ok(id) => id,
            Err(e) => {
                tx.rollback().await.ok();
                return Err(AppError::Transaction(format!("fiche insert failed: {}", e)));
            }
        };
        for document in &record.documents {
            if let Err(e) = self.documents.insert_tx(&mut tx, fiche_id, document).await {
                tx.rollback().await.ok();
                return Err(AppError::Transaction(format!(
                    "document '{}' insert failed: {}",
                    document.name, e
                )));
            }
        }

        let mut relocated: Vec<PathBuf> = Vec::new();
        for relocation in &record.relocations {
            let destination = self.storage_root.join(&relocation.destination);
            match relocate_file(&relocation.extracted, &destination).await {
                Ok(()) => relocated.push(destination),
                Err(e) => {
                    tx.rollback().await.ok();
                    remove_relocated(&relocated).await;
                    return Err(AppError::Transaction(format!(
                        "relocating {} to {} failed: {}",
                        relocation.extracted.display(),
                        destination.display(),
                        e
                    )));
                }
            }
        }

        if let Err(e) = tx.commit().await {
            remove_relocated(&relocated).await;
            return Err(AppError::Transaction(format!(
                "commit failed after {} files were relocated (copies removed): {}",
                relocated.len(),
                e
            )));
        }

        tracing::info!(
            fiche_id = %fiche_id,
            documents = record.documents.len(),
            files = record.relocations.len(),
            "Record committed"
        );
        Ok(fiche_id)
    }
}

/// Copy a file out of the extraction tree into permanent storage, creating
/// destination directories as needed. The extraction-tree original stays in
/// place until the per-upload cleanup removes the whole tree.
async fn relocate_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(from, to).await?;
    Ok(())
}

/// Best-effort removal of already-relocated files after a failed commit.
/// A file that cannot be removed is a real database/filesystem divergence
/// and is logged as such.
async fn remove_relocated(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Orphaned storage file after rolled-back commit; manual cleanup needed"
            );
        }
    }
}
