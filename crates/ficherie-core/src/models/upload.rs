use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// How the upload was submitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    File,
    Api,
    Form,
}

impl Display for UploadType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadType::File => write!(f, "file"),
            UploadType::Api => write!(f, "api"),
            UploadType::Form => write!(f, "form"),
        }
    }
}

impl FromStr for UploadType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(UploadType::File),
            "api" => Ok(UploadType::Api),
            "form" => Ok(UploadType::Form),
            _ => Err(anyhow::anyhow!("Invalid upload type: {}", s)),
        }
    }
}

/// Processing lifecycle of an upload.
///
/// `Pending -> Processing` is written by the enqueuing side; the worker
/// writes one of the terminal states when it finishes with the item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processing,
    Done,
    Partial,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Done | UploadStatus::Partial | UploadStatus::Failed
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Processing => write!(f, "processing"),
            UploadStatus::Done => write!(f, "done"),
            UploadStatus::Partial => write!(f, "partial"),
            UploadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "processing" => Ok(UploadStatus::Processing),
            "done" => Ok(UploadStatus::Done),
            "partial" => Ok(UploadStatus::Partial),
            "failed" => Ok(UploadStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// One user-submitted artifact awaiting (or past) background processing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    #[sqlx(rename = "type")]
    pub upload_type: UploadType,
    pub date: DateTime<Utc>,
    pub file_name: String,
    /// Storage-relative path of the submitted archive.
    pub path: String,
    pub hash: String,
    pub status: UploadStatus,
}
