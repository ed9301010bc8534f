//! Configuration module
//!
//! Environment-driven configuration for the ingestion worker: database and
//! queue endpoints, storage roots, and pipeline tuning knobs.

use std::env;
use std::path::PathBuf;

use crate::error::AppError;

const DEFAULT_QUEUE_KEY: &str = "uploadsToProcess";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_EXTRACT_BATCH_SIZE: usize = 8;
const DEFAULT_MAX_ARCHIVE_DEPTH: usize = 10;

/// Worker configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Redis connection string.
    pub redis_url: String,
    /// Redis list key the upload ids are popped from.
    pub queue_key: String,
    /// Root directory for permanent record/document files.
    pub storage_root: PathBuf,
    /// Root directory for in-flight extraction trees.
    pub tmp_root: PathBuf,
    pub db_max_connections: u32,
    /// Number of zip entries extracted concurrently per batch.
    pub extract_batch_size: usize,
    /// Maximum nesting depth for archives inside archives.
    pub max_archive_depth: usize,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `DATABASE_URL`, `REDIS_URL`, `FILE_STORAGE_PATH` and
    /// `TMP_STORAGE_PATH` are required; the remaining keys fall back to
    /// defaults.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            queue_key: env::var("QUEUE_KEY").unwrap_or_else(|_| DEFAULT_QUEUE_KEY.to_string()),
            storage_root: PathBuf::from(require_env("FILE_STORAGE_PATH")?),
            tmp_root: PathBuf::from(require_env("TMP_STORAGE_PATH")?),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            extract_batch_size: parse_nonzero_env(
                "EXTRACT_BATCH_SIZE",
                DEFAULT_EXTRACT_BATCH_SIZE,
            )?,
            max_archive_depth: parse_nonzero_env(
                "MAX_ARCHIVE_DEPTH",
                DEFAULT_MAX_ARCHIVE_DEPTH,
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{} must be set", key)))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} is not a valid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_nonzero_env(key: &str, default: usize) -> Result<usize, AppError> {
    let value: usize = parse_env(key, default)?;
    if value == 0 {
        return Err(AppError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}
