// sink/src/lib.rs

//! The sink layer: persists row sets produced by the row extractor. Three
//! non-SQL kinds (`stdout`, `file`, `null`) exist for dry runs and local
//! development; the `postgres` kind is the durable store with block-atomic
//! or batch-insert write modes, height-partitioned tables, and conflict-safe
//! upserts. All four implement the same `Sink` trait.

mod lines;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use config::{Config, SinkKind};
use thiserror::Error;
use types::RowSet;

pub use lines::LineSink;
pub use postgres::PgSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sink kind {0:?} is recognized but not implemented")]
    Unsupported(String),
}

/// Common contract every sink backend implements. `write` is called once per
/// assembled block, in strictly ascending height order; `flush` forces any
/// buffered rows out immediately (used by the follow runner between polls
/// and by graceful shutdown); `resume_height` reports the last durably
/// committed height, if the backend can answer that question.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, rows: RowSet) -> Result<(), SinkError>;
    async fn flush(&self) -> Result<(), SinkError>;
    async fn close(&self) -> Result<(), SinkError>;
    async fn resume_height(&self) -> Result<Option<u64>, SinkError>;
}

/// Construct the configured sink backend. Postgres sinks open a connection
/// pool eagerly so a misconfigured database fails fast at start-up rather
/// than on the first flush.
pub async fn build(cfg: &Config) -> Result<Arc<dyn Sink>, SinkError> {
    match cfg.sink.sink_kind {
        SinkKind::Stdout => Ok(Arc::new(LineSink::stdout())),
        SinkKind::File => {
            let path = cfg
                .sink
                .out_path
                .clone()
                .unwrap_or_else(|| "indexer-output.jsonl".into());
            Ok(Arc::new(LineSink::file(path, cfg.sink.flush_every)?))
        }
        SinkKind::Null => Ok(Arc::new(LineSink::null())),
        SinkKind::Postgres => Ok(Arc::new(PgSink::connect(&cfg.pg).await?)),
        // Config::validate rejects this before the sink is ever built; this
        // arm only guards against a caller that skips validation.
        SinkKind::Clickhouse => Err(SinkError::Unsupported("clickhouse".to_string())),
    }
}
