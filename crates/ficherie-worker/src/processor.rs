//! Pipeline orchestrator.
//!
//! Drives one dequeued upload through the full state machine:
//! `Dequeued -> Extracting -> Walking -> PerRecordProcessing -> Cleanup ->
//! Done`, with `Failed` reachable from any state. The per-upload temp
//! directory is owned here: created before extraction, recursively removed
//! afterwards whatever the outcome. One record folder's failure never
//! stops its siblings; extraction and filesystem faults abort the whole
//! upload. Nothing is ever re-enqueued from here.

use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use ficherie_core::models::{Upload, UploadStatus};
use ficherie_core::{AppError, Config};
use ficherie_db::UploadRepository;
use ficherie_processing::archive::is_archive;
use ficherie_processing::{
    classify_record_folder, discover_record_folders, extract_archive, list_files,
};

use crate::commit::RecordCommitter;
use crate::validate::{DbCatalog, RecordValidator};

/// Per-upload processing tally, folded into the terminal status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub folders: usize,
    pub committed: usize,
    pub failed: usize,
}

impl UploadOutcome {
    /// Terminal status written back onto the upload row.
    ///
    /// An upload with no record folders at all processed successfully and
    /// is `done`; folders that all failed make it `failed`; a mix is
    /// `partial`.
    pub fn terminal_status(&self) -> UploadStatus {
        if self.committed == self.folders {
            UploadStatus::Done
        } else if self.committed > 0 {
            UploadStatus::Partial
        } else {
            UploadStatus::Failed
        }
    }
}

pub struct UploadProcessor {
    uploads: UploadRepository,
    validator: RecordValidator<DbCatalog>,
    committer: RecordCommitter,
    config: Config,
}

impl UploadProcessor {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            uploads: UploadRepository::new(pool.clone()),
            validator: RecordValidator::new(DbCatalog::new(pool.clone())),
            committer: RecordCommitter::new(pool, config.storage_root.clone()),
            config,
        }
    }

    /// Process one dequeued upload id, best-effort.
    ///
    /// Never propagates an error to the run loop: every outcome ends in
    /// logs and, where the upload row exists, a terminal status write.
    pub async fn process(&self, raw_id: &str) {
        let upload_id = match Uuid::parse_str(raw_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(raw_id, error = %e, "Dequeued payload is not an upload id, dropping it");
                return;
            }
        };

        // Dequeued: the upload row must exist; a missing row drops the
        // item without retry.
        let upload = match self.uploads.get_by_id(upload_id).await {
            Ok(Some(upload)) => upload,
            Ok(None) => {
                tracing::error!(%upload_id, "Upload not found, dropping the item");
                return;
            }
            Err(e) => {
                tracing::error!(%upload_id, error = %e, "Upload lookup failed, dropping the item");
                return;
            }
        };
        if upload.status != UploadStatus::Processing {
            tracing::warn!(
                %upload_id,
                status = %upload.status,
                "Upload was enqueued with an unexpected status"
            );
        }

        let work_dir = self.config.tmp_root.join(upload_id.to_string());
        let result = self.run_pipeline(&upload, &work_dir).await;

        // Cleanup: the temp tree goes away whatever happened above.
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(
                    work_dir = %work_dir.display(),
                    error = %e,
                    "Failed to remove extraction directory"
                );
            }
        }

        let status = match &result {
            Ok(outcome) => {
                if outcome.folders == 0 {
                    tracing::warn!(%upload_id, "No record folders found in upload");
                }
                tracing::info!(
                    %upload_id,
                    folders = outcome.folders,
                    committed = outcome.committed,
                    failed = outcome.failed,
                    "Upload processed"
                );
                outcome.terminal_status()
            }
            Err(e) => {
                tracing::error!(%upload_id, error = %e, kind = e.error_type(), "Upload processing failed");
                UploadStatus::Failed
            }
        };

        if let Err(e) = self.uploads.update_status(upload_id, status).await {
            tracing::error!(%upload_id, error = %e, "Terminal status write-back failed");
        }
    }

    /// Extracting -> Walking -> PerRecordProcessing.
    async fn run_pipeline(
        &self,
        upload: &Upload,
        work_dir: &Path,
    ) -> Result<UploadOutcome, AppError> {
        let archive_path = self.config.storage_root.join(&upload.path);
        unpack_archive_tree(
            &archive_path,
            work_dir,
            self.config.extract_batch_size,
            self.config.max_archive_depth,
        )
        .await?;

        let files = list_files(work_dir).await?;
        let folders = discover_record_folders(&files);
        tracing::info!(
            upload_id = %upload.id,
            files = files.len(),
            folders = folders.len(),
            "Extraction tree walked"
        );

        let mut outcome = UploadOutcome {
            folders: folders.len(),
            ..Default::default()
        };
        for folder in &folders {
            match self.process_record_folder(upload, folder, &files).await {
                Ok(fiche_id) => {
                    outcome.committed += 1;
                    tracing::info!(folder = %folder.display(), %fiche_id, "Record folder committed");
                }
                Err(e) if e.is_record_level() => {
                    outcome.failed += 1;
                    tracing::warn!(
                        folder = %folder.display(),
                        error = %e,
                        kind = e.error_type(),
                        "Record folder skipped"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    async fn process_record_folder(
        &self,
        upload: &Upload,
        folder: &Path,
        files: &[PathBuf],
    ) -> Result<Uuid, AppError> {
        let record = classify_record_folder(folder, files)?;
        let normalized = self.validator.validate(upload, &record).await?;
        self.committer.commit(&normalized).await
    }
}

/// Fully unpack an archive and every archive nested inside it, depth-first.
///
/// Runs on an explicit work-list of `(archive, output dir)` pairs rather
/// than call recursion, so nesting depth is bounded deliberately: each
/// nested archive found by re-walking an output tree is pushed with a
/// fresh `nested/<stem>` output directory, and exceeding `max_depth` fails
/// the upload.
pub async fn unpack_archive_tree(
    archive: &Path,
    output_dir: &Path,
    batch_size: usize,
    max_depth: usize,
) -> Result<(), AppError> {
    let mut work = vec![(archive.to_path_buf(), output_dir.to_path_buf(), 0usize)];

    while let Some((zip_path, out_dir, depth)) = work.pop() {
        if depth >= max_depth {
            return Err(AppError::Extraction(format!(
                "archive nesting in {} exceeds the depth limit of {}",
                archive.display(),
                max_depth
            )));
        }
        extract_archive(&zip_path, &out_dir, batch_size).await?;

        for file in list_files(&out_dir).await? {
            if is_archive(&file) {
                let stem = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "archive".to_string());
                // Namespaced next to the archive itself, so equally named
                // archives in different subtrees cannot collide.
                let nested_out = file
                    .parent()
                    .unwrap_or(out_dir.as_path())
                    .join("nested")
                    .join(stem);
                tracing::debug!(
                    nested = %file.display(),
                    output = %nested_out.display(),
                    depth = depth + 1,
                    "Nested archive queued"
                );
                work.push((file, nested_out, depth + 1));
            }
        }
    }

    Ok(())
}
