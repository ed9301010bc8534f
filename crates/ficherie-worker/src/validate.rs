//! Record validation.
//!
//! Turns a classified record folder into a normalized, insert-ready record
//! or a structured failure. Checks run fail-fast in a fixed order, each
//! with a user-facing message; a failing folder never reaches the database
//! and never affects its siblings.
//!
//! The catalog lookups (fiche/document hash dedup, source resolution) sit
//! behind [`CatalogLookup`] so the validator can be exercised against an
//! in-memory catalog in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use ficherie_core::models::{
    Descriptor, DocumentType, FileDescriptor, NewDocument, NewFiche, Source, Upload,
};
use ficherie_core::AppError;
use ficherie_db::{DocumentRepository, FicheRepository, SourceRepository};
use ficherie_processing::discovery::{DocumentPair, RecordFolder, ORIGIN_DIR_NAME};
use ficherie_processing::hash_file;

/// Expected format of the descriptor's generation date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read-only catalog state the validator checks records against.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn fiche_hash_exists(&self, hash: &str) -> Result<bool, AppError>;
    async fn document_hash_exists(&self, hash: &str) -> Result<bool, AppError>;
    async fn source_by_name(&self, name: &str) -> Result<Option<Source>, AppError>;
}

/// Catalog lookups backed by the live database.
#[derive(Clone)]
pub struct DbCatalog {
    fiches: FicheRepository,
    documents: DocumentRepository,
    sources: SourceRepository,
}

impl DbCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            fiches: FicheRepository::new(pool.clone()),
            documents: DocumentRepository::new(pool.clone()),
            sources: SourceRepository::new(pool),
        }
    }
}

#[async_trait]
impl CatalogLookup for DbCatalog {
    async fn fiche_hash_exists(&self, hash: &str) -> Result<bool, AppError> {
        self.fiches.hash_exists(hash).await
    }

    async fn document_hash_exists(&self, hash: &str) -> Result<bool, AppError> {
        self.documents.hash_exists(hash).await
    }

    async fn source_by_name(&self, name: &str) -> Result<Option<Source>, AppError> {
        self.sources.get_by_name(name).await
    }
}

/// One file move the committer must perform: from the extraction tree to a
/// storage-root-relative destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub extracted: PathBuf,
    pub destination: String,
}

/// A fully validated record, ready for the committer.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub fiche: NewFiche,
    pub documents: Vec<NewDocument>,
    pub relocations: Vec<Relocation>,
}

pub struct RecordValidator<C> {
    catalog: C,
}

impl<C: CatalogLookup> RecordValidator<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Validate a classified record folder against the descriptor contract
    /// and the catalog, producing the normalized record on success.
    pub async fn validate(
        &self,
        upload: &Upload,
        record: &RecordFolder,
    ) -> Result<NormalizedRecord, AppError> {
        // 1. Parse the descriptor into its strict typed shape.
        let bytes = tokio::fs::read(&record.descriptor).await?;
        let descriptor = Descriptor::parse(&bytes).map_err(|e| {
            AppError::Validation(format!(
                "descriptor {} is not valid: {}",
                record.descriptor.display(),
                e
            ))
        })?;

        // 2. Dedup the record by its primary document's content.
        let primary_hash = hash_file(&record.primary_document).await?;
        if self.catalog.fiche_hash_exists(&primary_hash).await? {
            return Err(AppError::Duplicate(format!(
                "a fiche with the same primary document already exists (hash {})",
                primary_hash
            )));
        }

        // 3. Required descriptor fields.
        if descriptor.dump.trim().is_empty() {
            return Err(AppError::Validation(
                "descriptor is missing its dump correlation token".to_string(),
            ));
        }
        let source = self
            .catalog
            .source_by_name(&descriptor.source)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("unknown source '{}'", descriptor.source)))?;
        if descriptor.object.trim().is_empty() || descriptor.summary.trim().is_empty() {
            return Err(AppError::Validation(
                "object and summary must both be provided".to_string(),
            ));
        }
        let date = NaiveDate::parse_from_str(&descriptor.date, DATE_FORMAT).map_err(|_| {
            AppError::Validation(format!(
                "invalid generation date '{}' (expected YYYY-MM-DD)",
                descriptor.date
            ))
        })?;

        // 4. Declared file list must match the discovered pairs one-to-one.
        if descriptor.files.len() != record.pairs.len() {
            return Err(AppError::Validation(format!(
                "descriptor declares {} files but {} document pairs were found",
                descriptor.files.len(),
                record.pairs.len()
            )));
        }

        // 5. Field-level checks on every declared file.
        let mut doc_types = Vec::with_capacity(descriptor.files.len());
        for (index, file) in descriptor.files.iter().enumerate() {
            doc_types.push(check_file_descriptor(index, file)?);
        }

        // 6./7. Pairs must be physically complete and not collide with
        // committed documents; normalize everything the committer needs.
        let folder_name = record.folder_name();
        let destination_dir = destination_dir(&source.name, date, &folder_name);

        let mut relocations = vec![Relocation {
            extracted: record.primary_document.clone(),
            destination: join_destination(&destination_dir, &file_name_of(&record.primary_document)),
        }];

        let mut documents = Vec::with_capacity(descriptor.files.len());
        for ((index, file), doc_type) in descriptor.files.iter().enumerate().zip(doc_types) {
            let pair = record
                .pairs
                .iter()
                .find(|p| p.index == index)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "file #{}: no source/origin document pair with prefix {}",
                        index + 1,
                        index + 1
                    ))
                })?;
            let (source_path, origin_path) = require_complete_pair(index, file, pair)?;
            require_present(index, file, source_path).await?;
            require_present(index, file, origin_path).await?;

            let document_hash = hash_file(source_path).await?;
            if self.catalog.document_hash_exists(&document_hash).await? {
                return Err(AppError::Duplicate(format!(
                    "file #{} ('{}'): a document with the same content already exists (hash {})",
                    index + 1,
                    file.name,
                    document_hash
                )));
            }
            let origin_hash = hash_file(origin_path).await?;

            let document_destination =
                join_destination(&destination_dir, &file_name_of(source_path));
            let origin_destination = join_destination(
                &format!("{}/{}", destination_dir, ORIGIN_DIR_NAME),
                &file_name_of(origin_path),
            );
            relocations.push(Relocation {
                extracted: source_path.clone(),
                destination: document_destination.clone(),
            });
            relocations.push(Relocation {
                extracted: origin_path.clone(),
                destination: origin_destination.clone(),
            });

            // Only File-typed documents persist their undecoded original.
            let (original_name, original_path, original_hash) =
                if doc_type == DocumentType::File {
                    (
                        Some(file.original_name.clone()),
                        Some(origin_destination),
                        Some(origin_hash),
                    )
                } else {
                    (None, None, None)
                };

            documents.push(NewDocument {
                doc_type,
                name: file.name.clone(),
                path: document_destination,
                hash: document_hash,
                content: file.content.clone(),
                metadata: file
                    .metadata
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
                original_name,
                original_path,
                original_hash,
            });
        }

        let fiche = NewFiche {
            reference: generate_reference(date),
            source_id: source.id,
            object: descriptor.object,
            summary: descriptor.summary,
            date,
            hash: primary_hash,
            path: destination_dir,
            upload_id: upload.id,
            dump: descriptor.dump,
        };

        Ok(NormalizedRecord {
            fiche,
            documents,
            relocations,
        })
    }
}

/// Field-level requirements for one declared file entry.
fn check_file_descriptor(index: usize, file: &FileDescriptor) -> Result<DocumentType, AppError> {
    let position = index + 1;
    if file.name.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "file #{}: a target file name is required",
            position
        )));
    }
    if file.original_name.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "file #{}: an original file name is required",
            position
        )));
    }
    let doc_type: DocumentType = file.doc_type.parse().map_err(|_| {
        AppError::Validation(format!(
            "file #{}: unknown document type '{}'",
            position, file.doc_type
        ))
    })?;
    if file.content.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "file #{}: content is required",
            position
        )));
    }

    if doc_type == DocumentType::Message {
        let metadata = file.metadata.as_ref().ok_or_else(|| {
            AppError::Validation(format!(
                "file #{}: message metadata is required for Message documents",
                position
            ))
        })?;
        if metadata.sender.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "file #{}: message sender is required",
                position
            )));
        }
        if metadata.recipients.is_empty()
            || metadata.recipients.iter().any(|r| r.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "file #{}: at least one message recipient is required",
                position
            )));
        }
        if metadata.date.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "file #{}: message date is required",
                position
            )));
        }
        if metadata.subject.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "file #{}: message subject is required",
                position
            )));
        }
    }

    Ok(doc_type)
}

fn require_complete_pair<'a>(
    index: usize,
    file: &FileDescriptor,
    pair: &'a DocumentPair,
) -> Result<(&'a PathBuf, &'a PathBuf), AppError> {
    let source = pair.source.as_ref().ok_or_else(|| {
        AppError::Validation(format!(
            "file #{} ('{}'): the source document is missing",
            index + 1,
            file.name
        ))
    })?;
    let origin = pair.origin.as_ref().ok_or_else(|| {
        AppError::Validation(format!(
            "file #{} ('{}'): the origin document is missing under {}/",
            index + 1,
            file.name,
            ORIGIN_DIR_NAME
        ))
    })?;
    Ok((source, origin))
}

async fn require_present(
    index: usize,
    file: &FileDescriptor,
    path: &Path,
) -> Result<(), AppError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(AppError::Validation(format!(
            "file #{} ('{}'): {} is no longer present on disk",
            index + 1,
            file.name,
            path.display()
        )));
    }
    Ok(())
}

/// Storage-root-relative destination directory for a record's files,
/// derived from source name, generation date, and folder name.
pub fn destination_dir(source_name: &str, date: NaiveDate, folder_name: &str) -> String {
    format!(
        "fiches/{}/{}/{}",
        source_name,
        date.format("%Y%m%d"),
        folder_name
    )
}

fn join_destination(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir, file_name)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Generated reference code: generation date plus a short random suffix.
pub fn generate_reference(date: NaiveDate) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", date.format("%Y%m%d"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use chrono::Utc;
    use ficherie_core::models::{UploadStatus, UploadType};
    use ficherie_processing::{classify_record_folder, list_files};
    use std::collections::{HashMap, HashSet};
    use tempfile::tempdir;

    #[derive(Default)]
    struct MockCatalog {
        fiche_hashes: HashSet<String>,
        document_hashes: HashSet<String>,
        sources: HashMap<String, Source>,
    }

    impl MockCatalog {
        fn with_source(name: &str) -> Self {
            let mut catalog = Self::default();
            catalog.sources.insert(
                name.to_string(),
                Source {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                },
            );
            catalog
        }
    }

    #[async_trait]
    impl CatalogLookup for MockCatalog {
        async fn fiche_hash_exists(&self, hash: &str) -> Result<bool, AppError> {
            Ok(self.fiche_hashes.contains(hash))
        }

        async fn document_hash_exists(&self, hash: &str) -> Result<bool, AppError> {
            Ok(self.document_hashes.contains(hash))
        }

        async fn source_by_name(&self, name: &str) -> Result<Option<Source>, AppError> {
            Ok(self.sources.get(name).cloned())
        }
    }

    fn test_upload() -> Upload {
        Upload {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            display_name: "14decembre2022-file-1".to_string(),
            upload_type: UploadType::File,
            date: Utc::now(),
            file_name: "envoi.zip".to_string(),
            path: "data/uploads/20221214/1 - file - envoi.zip".to_string(),
            hash: "upload-hash".to_string(),
            status: UploadStatus::Processing,
        }
    }

    fn well_formed_descriptor() -> serde_json::Value {
        serde_json::json!({
            "dump": "dump-42",
            "source": "tribunal",
            "object": "Dossier 4821",
            "summary": "Correspondance saisie",
            "date": "2022-12-14",
            "files": [
                {
                    "type": "File",
                    "name": "piece.pdf",
                    "originalName": "piece_original.eml",
                    "content": "transcribed text"
                }
            ]
        })
    }

    /// Write a record folder to disk and classify it.
    async fn write_record_folder(
        root: &Path,
        descriptor: &serde_json::Value,
    ) -> RecordFolder {
        let folder = root.join("dossier");
        tokio::fs::create_dir_all(folder.join(ORIGIN_DIR_NAME))
            .await
            .unwrap();
        tokio::fs::write(folder.join("data.json"), serde_json::to_vec(descriptor).unwrap())
            .await
            .unwrap();
        tokio::fs::write(folder.join("fiche.docx"), b"primary document bytes")
            .await
            .unwrap();
        tokio::fs::write(folder.join("1 - piece.pdf"), b"source document bytes")
            .await
            .unwrap();
        tokio::fs::write(
            folder.join(ORIGIN_DIR_NAME).join("1 - piece_original.eml"),
            b"origin document bytes",
        )
        .await
        .unwrap();

        let files = list_files(root).await.unwrap();
        classify_record_folder(&folder, &files).unwrap()
    }

    #[tokio::test]
    async fn normalizes_a_well_formed_record() {
        let dir = tempdir().unwrap();
        let record = write_record_folder(dir.path(), &well_formed_descriptor()).await;
        let upload = test_upload();
        let validator = RecordValidator::new(MockCatalog::with_source("tribunal"));

        let normalized = validator.validate(&upload, &record).await.unwrap();

        assert_eq!(normalized.fiche.object, "Dossier 4821");
        assert_eq!(normalized.fiche.dump, "dump-42");
        assert_eq!(normalized.fiche.upload_id, upload.id);
        assert_eq!(normalized.fiche.date.year(), 2022);
        assert_eq!(normalized.fiche.path, "fiches/tribunal/20221214/dossier");
        assert!(normalized.fiche.reference.starts_with("20221214-"));
        assert_eq!(normalized.fiche.hash.len(), 64);

        assert_eq!(normalized.documents.len(), 1);
        let document = &normalized.documents[0];
        assert_eq!(document.doc_type, DocumentType::File);
        assert_eq!(document.name, "piece.pdf");
        assert_eq!(
            document.path,
            "fiches/tribunal/20221214/dossier/1 - piece.pdf"
        );
        assert_eq!(document.original_name.as_deref(), Some("piece_original.eml"));
        assert_eq!(
            document.original_path.as_deref(),
            Some("fiches/tribunal/20221214/dossier/Source/1 - piece_original.eml")
        );
        assert!(document.original_hash.is_some());
        assert_ne!(document.hash, normalized.fiche.hash);

        // Primary + source + origin all scheduled for relocation.
        assert_eq!(normalized.relocations.len(), 3);
        assert_eq!(
            normalized.relocations[0].destination,
            "fiches/tribunal/20221214/dossier/fiche.docx"
        );
    }

    #[tokio::test]
    async fn duplicate_primary_document_is_a_conflict() {
        let dir = tempdir().unwrap();
        let record = write_record_folder(dir.path(), &well_formed_descriptor()).await;
        let upload = test_upload();

        let mut catalog = MockCatalog::with_source("tribunal");
        let primary_hash = hash_file(&record.primary_document).await.unwrap();
        catalog.fiche_hashes.insert(primary_hash);

        let err = RecordValidator::new(catalog)
            .validate(&upload, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }

    #[tokio::test]
    async fn duplicate_document_content_is_a_conflict() {
        let dir = tempdir().unwrap();
        let record = write_record_folder(dir.path(), &well_formed_descriptor()).await;
        let upload = test_upload();

        let mut catalog = MockCatalog::with_source("tribunal");
        let pair = &record.pairs[0];
        let document_hash = hash_file(pair.source.as_ref().unwrap()).await.unwrap();
        catalog.document_hashes.insert(document_hash);

        let err = RecordValidator::new(catalog)
            .validate(&upload, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
        assert!(err.to_string().contains("piece.pdf"));
    }

    #[tokio::test]
    async fn unknown_source_is_not_found() {
        let dir = tempdir().unwrap();
        let record = write_record_folder(dir.path(), &well_formed_descriptor()).await;
        let err = RecordValidator::new(MockCatalog::default())
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("tribunal"));
    }

    #[tokio::test]
    async fn malformed_descriptor_fails_first() {
        let dir = tempdir().unwrap();
        let record = write_record_folder(dir.path(), &well_formed_descriptor()).await;
        tokio::fs::write(&record.descriptor, b"{ not json")
            .await
            .unwrap();

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("not valid"));
    }

    #[tokio::test]
    async fn invalid_date_is_rejected() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["date"] = "14/12/2022".into();
        let record = write_record_folder(dir.path(), &descriptor).await;

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("14/12/2022"));
    }

    #[tokio::test]
    async fn empty_object_or_summary_is_rejected() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["summary"] = "  ".into();
        let record = write_record_folder(dir.path(), &descriptor).await;

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("object and summary"));
    }

    #[tokio::test]
    async fn declared_count_must_match_discovered_pairs() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["files"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({
                "type": "Attachment",
                "name": "second.pdf",
                "originalName": "second_original.eml",
                "content": "more text"
            }));
        let record = write_record_folder(dir.path(), &descriptor).await;

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("declares 2 files but 1"));
    }

    #[tokio::test]
    async fn message_entries_require_envelope_metadata() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["files"][0]["type"] = "Message".into();
        let record = write_record_folder(dir.path(), &descriptor).await;

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("message metadata is required"));
    }

    #[tokio::test]
    async fn message_recipients_must_be_non_empty() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["files"][0]["type"] = "Message".into();
        descriptor["files"][0]["metadata"] = serde_json::json!({
            "sender": "greffe@example.org",
            "recipients": [],
            "date": "2022-12-01",
            "subject": "Transmission"
        });
        let record = write_record_folder(dir.path(), &descriptor).await;

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[tokio::test]
    async fn message_documents_do_not_persist_an_original() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["files"][0]["type"] = "Message".into();
        descriptor["files"][0]["metadata"] = serde_json::json!({
            "sender": "greffe@example.org",
            "recipients": ["avocat@example.org"],
            "date": "2022-12-01",
            "subject": "Transmission"
        });
        let record = write_record_folder(dir.path(), &descriptor).await;

        let normalized = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap();
        let document = &normalized.documents[0];
        assert_eq!(document.doc_type, DocumentType::Message);
        assert!(document.original_name.is_none());
        assert!(document.original_hash.is_none());
        assert!(document.metadata.is_some());
        // The origin file is still relocated alongside the record.
        assert_eq!(normalized.relocations.len(), 3);
    }

    #[tokio::test]
    async fn missing_origin_counterpart_is_rejected() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["files"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({
                "type": "Attachment",
                "name": "second.pdf",
                "originalName": "second_original.eml",
                "content": "more text"
            }));
        let record = write_record_folder(dir.path(), &descriptor).await;

        // A second source document whose origin counterpart never arrived:
        // pair #2 ends up half populated.
        tokio::fs::write(record.folder.join("2 - second.pdf"), b"second source")
            .await
            .unwrap();
        let files = list_files(dir.path()).await.unwrap();
        let record = classify_record_folder(&record.folder, &files).unwrap();
        assert!(record.pairs[1].origin.is_none());

        let err = RecordValidator::new(MockCatalog::with_source("tribunal"))
            .validate(&test_upload(), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("origin document is missing"));
    }

    #[tokio::test]
    async fn validation_failure_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut descriptor = well_formed_descriptor();
        descriptor["date"] = "not-a-date".into();
        let record = write_record_folder(dir.path(), &descriptor).await;
        let upload = test_upload();
        let validator = RecordValidator::new(MockCatalog::with_source("tribunal"));

        let first = validator.validate(&upload, &record).await.unwrap_err();
        let second = validator.validate(&upload, &record).await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn reference_embeds_the_generation_date() {
        let date = NaiveDate::from_ymd_opt(2022, 12, 14).unwrap();
        let reference = generate_reference(date);
        assert!(reference.starts_with("20221214-"));
        assert_eq!(reference.len(), "20221214-".len() + 8);
        assert_ne!(reference, generate_reference(date));
    }

    #[test]
    fn destination_is_derived_from_source_date_and_folder() {
        let date = NaiveDate::from_ymd_opt(2022, 12, 14).unwrap();
        assert_eq!(
            destination_dir("tribunal", date, "dossier"),
            "fiches/tribunal/20221214/dossier"
        );
    }
}
