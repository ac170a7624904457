// client/src/lib.rs

//! A typed RPC client sitting atop the rate-limited `transport` crate: the
//! three calls the ingest engine needs (`status`, `block`, `block_results`),
//! deserializing the transport's raw JSON into the `types::raw` wire shapes.

use thiserror::Error;
use transport::{Transport, TransportError};
use types::raw::{BlockResponse, BlockResultsResponse, ChainStatus};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// High-level CometBFT RPC client used by the range/follow runners.
#[derive(Clone)]
pub struct RpcClient {
    transport: Transport,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").finish()
    }
}

impl RpcClient {
    pub fn new(transport: Transport) -> Self {
        RpcClient { transport }
    }

    /// `GET /status` — earliest/latest reachable heights.
    pub async fn status(&self) -> Result<ChainStatus, ClientError> {
        let raw = self.transport.status().await?;
        Ok(transport::parse(raw)?)
    }

    /// `GET /block?height=N`.
    pub async fn block(&self, height: u64) -> Result<BlockResponse, ClientError> {
        let raw = self.transport.block(height).await?;
        Ok(transport::parse(raw)?)
    }

    /// `GET /block_results?height=N`.
    pub async fn block_results(&self, height: u64) -> Result<BlockResultsResponse, ClientError> {
        let raw = self.transport.block_results(height).await?;
        Ok(transport::parse(raw)?)
    }
}
