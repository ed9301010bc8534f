use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One structured record extracted from an upload's archive tree.
///
/// The content hash is that of the record's primary composed document and is
/// unique across all fiches ever committed; a second record carrying the
/// same hash is rejected as a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fiche {
    pub id: Uuid,
    pub reference: String,
    pub source_id: Uuid,
    pub object: String,
    pub summary: String,
    /// Declared generation date of the record.
    pub date: NaiveDate,
    pub hash: String,
    /// Storage-relative destination directory of the record's files.
    pub path: String,
    pub upload_id: Uuid,
    /// Opaque correlation token carried over from the descriptor.
    pub dump: String,
}

/// Insertable fiche row, produced by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFiche {
    pub reference: String,
    pub source_id: Uuid,
    pub object: String,
    pub summary: String,
    pub date: NaiveDate,
    pub hash: String,
    pub path: String,
    pub upload_id: Uuid,
    pub dump: String,
}
