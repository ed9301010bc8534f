use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of file attached to a fiche.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
pub enum DocumentType {
    File,
    Message,
    Attachment,
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentType::File => write!(f, "File"),
            DocumentType::Message => write!(f, "Message"),
            DocumentType::Attachment => write!(f, "Attachment"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "File" => Ok(DocumentType::File),
            "Message" => Ok(DocumentType::Message),
            "Attachment" => Ok(DocumentType::Attachment),
            _ => Err(anyhow::anyhow!("Invalid document type: {}", s)),
        }
    }
}

/// One file belonging to a committed fiche.
///
/// `File`-typed documents also carry their undecoded origin-side sibling
/// (`original_*`); the content hash is unique across all documents.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub fiche_id: Uuid,
    #[sqlx(rename = "type")]
    pub doc_type: DocumentType,
    pub name: String,
    pub path: String,
    pub hash: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub original_name: Option<String>,
    pub original_path: Option<String>,
    pub original_hash: Option<String>,
}

/// Insertable document row, produced by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub doc_type: DocumentType,
    pub name: String,
    pub path: String,
    pub hash: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub original_name: Option<String>,
    pub original_path: Option<String>,
    pub original_hash: Option<String>,
}
