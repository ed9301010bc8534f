//! Database repositories for the ficherie ingestion pipeline.

pub mod db;

pub use db::{
    DocumentRepository, FicheRepository, SourceRepository, TransactionGuard, UploadRepository,
};
