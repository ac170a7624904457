// decoder/src/pool.rs

//! A bounded pool of decoder workers sharing one immutable `TypeRegistry`.
//! Modeled as a fixed set of Tokio tasks consuming `(oneshot::Sender,
//! base64)` requests from a channel bounded at `pool_size`, so `submit`
//! naturally backpressures once that many decodes are in flight.

use base64::{engine::general_purpose::STANDARD, Engine};
use normalize::CaseMode;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use types::record::DecodedTx;

use crate::registry::TypeRegistry;
use crate::tx::decode_tx_bytes;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("tx bytes are not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("decoder pool is closed")]
    Closed,
}

struct Request {
    base64: String,
    case_mode: CaseMode,
    reply: oneshot::Sender<Result<DecodedTx, PoolError>>,
}

/// A pool of `pool_size` decoder workers, each running on its own Tokio
/// task so CPU-bound protobuf decoding is spread across the runtime's
/// worker threads.
pub struct DecoderPool {
    tx: mpsc::Sender<Request>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl DecoderPool {
    /// Spawn `pool_size` workers sharing `registry`.
    pub fn new(registry: Arc<TypeRegistry>, pool_size: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Request>(pool_size.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..pool_size.max(1))
            .map(|_| {
                let rx = rx.clone();
                let registry = registry.clone();
                tokio::spawn(async move {
                    loop {
                        let request = {
                            let mut guard = rx.lock().await;
                            guard.recv().await
                        };
                        let Some(request) = request else {
                            break;
                        };
                        let decoded = decode_request(&registry, &request.base64, request.case_mode);
                        let _ = request.reply.send(decoded);
                    }
                })
            })
            .collect();

        DecoderPool { tx, workers }
    }

    /// Decode one base64-encoded transaction. Blocks (asynchronously) until
    /// a worker is free and the decode completes; at most `pool_size`
    /// decodes are ever in flight across all callers.
    pub async fn submit(&self, base64: String, case_mode: CaseMode) -> Result<DecodedTx, PoolError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request {
                base64,
                case_mode,
                reply,
            })
            .await
            .map_err(|_| PoolError::Closed)?;
        rx.await.map_err(|_| PoolError::Closed)?
    }

    /// Terminate workers gracefully: drop the sender so each worker's
    /// `recv()` returns `None` after draining in-flight requests, then wait
    /// for all worker tasks to finish.
    pub async fn close(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

fn decode_request(
    registry: &TypeRegistry,
    base64: &str,
    case_mode: CaseMode,
) -> Result<DecodedTx, PoolError> {
    let bytes = STANDARD.decode(base64)?;
    Ok(decode_tx_bytes(&bytes, registry, case_mode))
}
