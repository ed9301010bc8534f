use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use ficherie_core::Config;
use ficherie_worker::{telemetry, UploadProcessor, UploadQueue};

const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const QUEUE_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_telemetry();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let queue = UploadQueue::new(&config.redis_url, config.queue_key.clone())
        .context("Failed to create queue client")?;
    let processor = UploadProcessor::new(pool, config);

    tracing::info!(queue_key = queue.key(), "Worker listening for upload ids");
    run(&queue, &processor).await
}

/// Consume the queue forever. Queue faults are logged and retried with a
/// fresh connection instead of killing the worker; a crash between pop and
/// completion loses that item (there is no redelivery).
async fn run(queue: &UploadQueue, processor: &UploadProcessor) -> Result<()> {
    loop {
        let mut conn = match queue.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "Queue connection failed, retrying");
                tokio::time::sleep(QUEUE_RETRY_DELAY).await;
                continue;
            }
        };

        loop {
            match queue.pop_blocking(&mut conn).await {
                Ok(upload_id) => {
                    tracing::info!(%upload_id, "Dequeued upload");
                    processor.process(&upload_id).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Queue pop failed, reconnecting");
                    tokio::time::sleep(QUEUE_RETRY_DELAY).await;
                    break;
                }
            }
        }
    }
}
