//! Repository implementations for database access.
//!
//! One repository per table (`upload`, `fiche`, `document`, `source`), each
//! a thin struct over the shared pool issuing parameterized queries. The
//! schema is owned externally; this crate only consumes it.

pub mod document;
pub mod fiche;
pub mod source;
pub mod transaction;
pub mod upload;

pub use document::DocumentRepository;
pub use fiche::FicheRepository;
pub use source::SourceRepository;
pub use transaction::TransactionGuard;
pub use upload::UploadRepository;
