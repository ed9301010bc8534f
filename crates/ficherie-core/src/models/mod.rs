//! Data models for the ingestion pipeline
//!
//! One sub-module per domain entity; descriptor.rs models the
//! externally-authored `data.json` record descriptor.

mod descriptor;
mod document;
mod fiche;
mod source;
mod upload;

pub use descriptor::*;
pub use document::*;
pub use fiche::*;
pub use source::*;
pub use upload::*;
