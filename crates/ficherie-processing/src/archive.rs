//! Zip archive extraction.
//!
//! Entries are extracted in fixed-width batches: each batch spawns at most
//! `batch_size` blocking workers, and a batch completes before the next one
//! starts. That caps simultaneous open file handles and buffered entry data
//! no matter how many entries the archive holds. Every worker opens its own
//! archive handle, so handles are scoped to one entry's extraction and
//! released on all exit paths.
//!
//! Nested archives are not handled here; the pipeline driver re-walks the
//! output tree and feeds any `.zip` it finds back through
//! [`extract_archive`] with a fresh output directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::{ProcessingError, ProcessingResult};

/// File extension that marks an entry or extracted file as a nested archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

#[derive(Debug, Clone)]
enum EntryPlan {
    Directory(PathBuf),
    File { index: usize, dest: PathBuf },
}

/// Extract a zip archive into `output_dir`, creating it if absent.
///
/// Directory-marker entries become directories; file entries are streamed
/// to disk, `batch_size` at a time. Entries whose names escape the output
/// directory are rejected. A failed entry leaves a partially extracted tree
/// behind; cleaning that up is the caller's responsibility (the pipeline
/// owns the temp directory).
pub async fn extract_archive(
    zip_path: &Path,
    output_dir: &Path,
    batch_size: usize,
) -> ProcessingResult<()> {
    tokio::fs::create_dir_all(output_dir).await?;

    let plan = {
        let zip_path = zip_path.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        tokio::task::spawn_blocking(move || scan_entries(&zip_path, &output_dir))
            .await
            .map_err(|e| ProcessingError::Extraction(format!("scan task failed: {}", e)))??
    };

    let mut file_entries = Vec::new();
    for entry in plan {
        match entry {
            EntryPlan::Directory(dir) => tokio::fs::create_dir_all(&dir).await?,
            EntryPlan::File { index, dest } => file_entries.push((index, dest)),
        }
    }

    tracing::debug!(
        archive = %zip_path.display(),
        entries = file_entries.len(),
        batch_size,
        "Extracting archive"
    );

    for batch in file_entries.chunks(batch_size.max(1)) {
        let handles: Vec<_> = batch
            .iter()
            .cloned()
            .map(|(index, dest)| {
                let zip_path = zip_path.to_path_buf();
                tokio::task::spawn_blocking(move || extract_entry(&zip_path, index, &dest))
            })
            .collect();

        for handle in handles {
            handle
                .await
                .map_err(|e| ProcessingError::Extraction(format!("extraction task failed: {}", e)))??;
        }
    }

    Ok(())
}

/// Enumerate all entries once and map their names to output paths.
fn scan_entries(zip_path: &Path, output_dir: &Path) -> ProcessingResult<Vec<EntryPlan>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ProcessingError::Extraction(format!("cannot open archive {}: {}", zip_path.display(), e))
    })?;

    let mut plan = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| {
            ProcessingError::Extraction(format!("cannot read entry #{}: {}", index, e))
        })?;

        // enclosed_name rejects absolute paths and `..` components (zip-slip).
        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            ProcessingError::Extraction(format!("entry '{}' has an unsafe path", entry.name()))
        })?;
        let dest = output_dir.join(relative);

        if entry.is_dir() {
            plan.push(EntryPlan::Directory(dest));
        } else {
            plan.push(EntryPlan::File { index, dest });
        }
    }

    Ok(plan)
}

/// Stream one entry's decompressed bytes to its output file.
fn extract_entry(zip_path: &Path, index: usize, dest: &Path) -> ProcessingResult<()> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ProcessingError::Extraction(format!("cannot open archive {}: {}", zip_path.display(), e))
    })?;
    let mut entry = archive.by_index(index).map_err(|e| {
        ProcessingError::Extraction(format!("cannot read entry #{}: {}", index, e))
    })?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    std::io::copy(&mut entry, &mut out).map_err(|e| {
        ProcessingError::Extraction(format!(
            "cannot write entry to {}: {}",
            dest.display(),
            e
        ))
    })?;

    Ok(())
}

/// Whether an extracted file is itself an archive to unpack.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        .unwrap_or(false)
}
