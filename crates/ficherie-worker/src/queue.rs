//! Upload queue consumer.
//!
//! The enqueuing side pushes upload ids onto a Redis list after flipping
//! the upload's status to `processing`. This side blocks on `BLPOP`, so a
//! queued id is delivered to exactly one consumer. There is no redelivery:
//! a consumer that dies mid-item loses that item, and retry means pushing
//! the id again from outside.

use ficherie_core::AppError;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

/// Blocking-pop consumer over a Redis list. The key is configured
/// (`QUEUE_KEY`, default `uploadsToProcess`).
pub struct UploadQueue {
    client: Client,
    key: String,
}

impl UploadQueue {
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::open(url)
            .map_err(|e| AppError::Queue(format!("invalid Redis URL {}: {}", url, e)))?;
        Ok(Self {
            client,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Open a connection for blocking pops. The run loop holds one
    /// connection and reconnects on failure.
    pub async fn connect(&self) -> Result<MultiplexedConnection, AppError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Queue(format!("Redis connection failed: {}", e)))
    }

    /// Block until an upload id is available and return it.
    ///
    /// The zero timeout parks the call server-side until a producer pushes;
    /// a nil reply is treated as a spurious wakeup and retried.
    pub async fn pop_blocking(
        &self,
        conn: &mut MultiplexedConnection,
    ) -> Result<String, AppError> {
        loop {
            let reply: Option<(String, String)> =
                conn.blpop(&self.key, 0.0).await.map_err(|e| {
                    AppError::Queue(format!("BLPOP on '{}' failed: {}", self.key, e))
                })?;
            if let Some((_list, upload_id)) = reply {
                return Ok(upload_id);
            }
        }
    }
}
