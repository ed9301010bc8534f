//! The `data.json` record descriptor.
//!
//! The descriptor is authored by the submitting system, not by us, so it is
//! parsed eagerly into a strict typed structure (unknown fields rejected)
//! before any field is used. Field-level requirements beyond shape —
//! non-emptiness, resolvable source, parseable date, known document type —
//! are enforced by the record validator, which owns the user-facing
//! messages.

use serde::{Deserialize, Serialize};

/// File name of the descriptor inside a record folder.
pub const DESCRIPTOR_FILE_NAME: &str = "data.json";

/// Message envelope metadata, required for `Message`-typed file entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MessageMetadata {
    pub sender: String,
    pub recipients: Vec<String>,
    pub date: String,
    pub subject: String,
}

/// One declared file entry of the descriptor's file list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileDescriptor {
    /// Declared kind; validated against the known document types later.
    #[serde(rename = "type")]
    pub doc_type: String,
    pub name: String,
    pub original_name: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    /// Optional source-relative path of the origin-side file.
    #[serde(default)]
    pub path: Option<String>,
}

/// Parsed `data.json` descriptor.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Descriptor {
    /// Opaque correlation token of the originating dump.
    pub dump: String,
    /// Name of the origin-system source catalog entry.
    pub source: String,
    pub object: String,
    pub summary: String,
    /// Generation date, `YYYY-MM-DD`.
    pub date: String,
    pub files: Vec<FileDescriptor>,
}

impl Descriptor {
    /// Parse descriptor bytes into the typed structure.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_descriptor() -> serde_json::Value {
        serde_json::json!({
            "dump": "dump-2022-12",
            "source": "tribunal",
            "object": "Dossier 4821",
            "summary": "Correspondance saisie",
            "date": "2022-12-14",
            "files": [
                {
                    "type": "File",
                    "name": "piece-1.pdf",
                    "originalName": "piece-1_original.eml",
                    "content": "transcribed text"
                }
            ]
        })
    }

    #[test]
    fn parses_a_well_formed_descriptor() {
        let bytes = serde_json::to_vec(&minimal_descriptor()).unwrap();
        let descriptor = Descriptor::parse(&bytes).unwrap();
        assert_eq!(descriptor.dump, "dump-2022-12");
        assert_eq!(descriptor.source, "tribunal");
        assert_eq!(descriptor.date, "2022-12-14");
        assert_eq!(descriptor.files.len(), 1);
        assert_eq!(descriptor.files[0].doc_type, "File");
        assert_eq!(descriptor.files[0].original_name, "piece-1_original.eml");
        assert!(descriptor.files[0].metadata.is_none());
    }

    #[test]
    fn parses_message_metadata() {
        let mut value = minimal_descriptor();
        value["files"][0]["type"] = "Message".into();
        value["files"][0]["metadata"] = serde_json::json!({
            "sender": "greffe@example.org",
            "recipients": ["avocat@example.org"],
            "date": "2022-12-01",
            "subject": "Transmission"
        });
        let descriptor = Descriptor::parse(&serde_json::to_vec(&value).unwrap()).unwrap();
        let metadata = descriptor.files[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.sender, "greffe@example.org");
        assert_eq!(metadata.recipients, vec!["avocat@example.org"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut value = minimal_descriptor();
        value["surprise"] = "field".into();
        assert!(Descriptor::parse(&serde_json::to_vec(&value).unwrap()).is_err());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut value = minimal_descriptor();
        value.as_object_mut().unwrap().remove("dump");
        assert!(Descriptor::parse(&serde_json::to_vec(&value).unwrap()).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Descriptor::parse(b"{ not json").is_err());
    }

    #[test]
    fn parse_failure_is_deterministic() {
        let bytes = b"{\"dump\": 12}";
        let first = Descriptor::parse(bytes).unwrap_err().to_string();
        let second = Descriptor::parse(bytes).unwrap_err().to_string();
        assert_eq!(first, second);
    }
}
