//! Record folder discovery and classification.
//!
//! A record folder is any directory holding a `data.json` descriptor.
//! Its immediate children are partitioned into the descriptor, the single
//! primary composed document, "source" variant documents, and — inside the
//! fixed-name `Source/` subdirectory — their "origin" counterparts. Source
//! and origin files are paired by the numeric prefix of their file names:
//! prefix N binds both sides to descriptor file-list index N-1.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ficherie_core::models::DESCRIPTOR_FILE_NAME;

use crate::error::{ProcessingError, ProcessingResult};

/// Fixed name of the subdirectory holding origin-side documents.
pub const ORIGIN_DIR_NAME: &str = "Source";

/// Extensions of the primary composed document.
const PRIMARY_DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc", "odt"];

/// Extensions of source-variant documents.
const SOURCE_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "eml", "msg", "xlsx", "xls"];

/// One source/origin pairing, keyed to descriptor file-list index `index`.
/// An unmatched prefix leaves one side empty; validation rejects those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    pub index: usize,
    pub source: Option<PathBuf>,
    pub origin: Option<PathBuf>,
}

/// A classified record folder, ready for validation.
#[derive(Debug, Clone)]
pub struct RecordFolder {
    pub folder: PathBuf,
    pub descriptor: PathBuf,
    pub primary_document: PathBuf,
    /// Pairs ordered by descriptor index.
    pub pairs: Vec<DocumentPair>,
}

impl RecordFolder {
    /// The folder's own name, used in destination paths.
    pub fn folder_name(&self) -> String {
        self.folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every distinct parent directory of a file named `data.json`.
pub fn discover_record_folders(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = files
        .iter()
        .filter(|f| f.file_name().is_some_and(|n| n == DESCRIPTOR_FILE_NAME))
        .filter_map(|f| f.parent().map(Path::to_path_buf))
        .collect();
    folders.sort();
    folders.dedup();
    folders
}

/// Partition a candidate folder's files into descriptor, primary document,
/// and source/origin pairs.
///
/// Fails with [`ProcessingError::Incomplete`] when the descriptor or the
/// primary document is absent or ambiguous, or when either document side is
/// entirely missing. Incomplete folders are skipped by the pipeline, not
/// fatal to it.
pub fn classify_record_folder(
    folder: &Path,
    files: &[PathBuf],
) -> ProcessingResult<RecordFolder> {
    let origin_dir = folder.join(ORIGIN_DIR_NAME);

    let mut descriptor = None;
    let mut primaries = Vec::new();
    let mut sources = Vec::new();
    let mut origins = Vec::new();

    for file in files {
        if file.parent() == Some(folder) {
            if file.file_name().is_some_and(|n| n == DESCRIPTOR_FILE_NAME) {
                descriptor = Some(file.clone());
            } else if has_extension(file, PRIMARY_DOCUMENT_EXTENSIONS) {
                primaries.push(file.clone());
            } else if has_extension(file, SOURCE_DOCUMENT_EXTENSIONS) {
                sources.push(file.clone());
            }
        } else if file.parent() == Some(origin_dir.as_path()) {
            origins.push(file.clone());
        }
    }

    let descriptor = descriptor.ok_or_else(|| {
        ProcessingError::Incomplete(format!(
            "folder {} has no {} descriptor",
            folder.display(),
            DESCRIPTOR_FILE_NAME
        ))
    })?;

    let primary_document = match primaries.len() {
        0 => {
            return Err(ProcessingError::Incomplete(format!(
                "folder {} has no primary document",
                folder.display()
            )))
        }
        1 => primaries.remove(0),
        n => {
            return Err(ProcessingError::Incomplete(format!(
                "folder {} has {} primary documents, expected exactly one",
                folder.display(),
                n
            )))
        }
    };

    if sources.is_empty() {
        return Err(ProcessingError::Incomplete(format!(
            "folder {} has no source documents",
            folder.display()
        )));
    }
    if origins.is_empty() {
        return Err(ProcessingError::Incomplete(format!(
            "folder {} has no origin documents under {}/",
            folder.display(),
            ORIGIN_DIR_NAME
        )));
    }

    let mut pairs: BTreeMap<usize, DocumentPair> = BTreeMap::new();
    for file in sources {
        match pair_index(&file) {
            Some(index) => {
                pairs
                    .entry(index)
                    .or_insert_with(|| empty_pair(index))
                    .source = Some(file);
            }
            None => {
                tracing::debug!(file = %file.display(), "Source document without numeric prefix, ignored");
            }
        }
    }
    for file in origins {
        match pair_index(&file) {
            Some(index) => {
                pairs
                    .entry(index)
                    .or_insert_with(|| empty_pair(index))
                    .origin = Some(file);
            }
            None => {
                tracing::debug!(file = %file.display(), "Origin document without numeric prefix, ignored");
            }
        }
    }

    if pairs.is_empty() {
        return Err(ProcessingError::Incomplete(format!(
            "folder {} has no prefixed source/origin documents",
            folder.display()
        )));
    }

    Ok(RecordFolder {
        folder: folder.to_path_buf(),
        descriptor,
        primary_document,
        pairs: pairs.into_values().collect(),
    })
}

fn empty_pair(index: usize) -> DocumentPair {
    DocumentPair {
        index,
        source: None,
        origin: None,
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Descriptor file-list index from a file name's leading numeric prefix
/// (prefix N maps to index N-1; prefix 0 or no prefix means unpaired).
fn pair_index(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    let prefix: usize = digits.parse().ok()?;
    prefix.checked_sub(1)
}
