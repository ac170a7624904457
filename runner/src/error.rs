// runner/src/error.rs

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the range and follow runners. Per-height failures
/// (`Client`, `Decode`, `Timeout`) are recovered by the per-height retry
/// budget and never escape `RangeRunner::run` directly — they're folded
/// into a skip marker once retries are exhausted. Only `Sink` errors and an
/// unexpected task panic (`TaskPanicked`) propagate out and stop the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("rpc client error: {0}")]
    Client(#[from] client::ClientError),
    #[error("decoder error: {0}")]
    Decode(#[from] decoder::PoolError),
    #[error("sink error: {0}")]
    Sink(#[from] sink::SinkError),
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("failed to parse chain height: {0}")]
    HeightParse(#[from] std::num::ParseIntError),
    #[error("a decode/assemble task panicked: {0}")]
    TaskPanicked(#[from] tokio::task::JoinError),
}
