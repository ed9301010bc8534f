//! Ficherie ingestion worker.
//!
//! Drains the upload queue and drives each upload through extraction,
//! record discovery, validation, and the per-record commit.

pub mod commit;
pub mod processor;
pub mod queue;
pub mod telemetry;
pub mod validate;

pub use commit::RecordCommitter;
pub use processor::{UploadOutcome, UploadProcessor};
pub use queue::UploadQueue;
pub use validate::{CatalogLookup, DbCatalog, NormalizedRecord, RecordValidator};
