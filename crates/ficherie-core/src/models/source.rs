use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named reference catalog entry a record descriptor must resolve against.
/// Lookup-only in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
}
