// runner/src/follow.rs

//! The follow runner: after a backfill reaches the configured `to` (or
//! immediately, if the caller only wants to follow the tip), repeatedly
//! polls `status` and hands any newly-reachable heights to a `RangeRunner`
//! invocation, looping forever until cancelled.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use client::RpcClient;
use sink::Sink;

use crate::error::RunnerError;
use crate::range::RangeRunner;

/// Drives the never-terminating "catch up to tip, then wait" loop.
pub struct FollowRunner {
    range: RangeRunner,
    client: Arc<RpcClient>,
    sink: Arc<dyn Sink>,
    concurrency: usize,
    poll_ms: u64,
}

impl FollowRunner {
    /// `concurrency` should already be clamped by the caller (the
    /// configuration surface's `min(cfg.concurrency, 16)`) — the follow
    /// runner doesn't second-guess it.
    pub fn new(
        range: RangeRunner,
        client: Arc<RpcClient>,
        sink: Arc<dyn Sink>,
        concurrency: usize,
        poll_ms: u64,
    ) -> Self {
        FollowRunner {
            range,
            client,
            sink,
            concurrency: concurrency.max(1),
            poll_ms,
        }
    }

    /// Poll and ingest starting from `next` until `cancel` fires. Never
    /// returns under normal operation.
    pub async fn run(&self, mut next: u64, cancel: &CancellationToken) -> Result<(), RunnerError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let status = self.client.status().await?;
            let latest = status.latest_block_height()?;

            if next <= latest {
                info!(from = next, to = latest, "follow: ingesting newly reachable heights");
                let follow_range = self.range.for_follow(self.concurrency);
                let outcome = follow_range.run(next, latest, cancel).await?;
                self.sink.flush().await?;
                debug!(
                    processed = outcome.processed,
                    skipped = outcome.skipped,
                    "follow: flushed sink after catching up"
                );
                next = latest + 1;
            } else {
                let jitter = rand::thread_rng().gen_range(0.8..1.2_f64);
                let sleep_for = Duration::from_millis((self.poll_ms as f64 * jitter) as u64);
                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {}
                    _ = cancel.cancelled() => return Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoder::{DecoderPool, TypeRegistry};
    use mockito::{Matcher, Server};
    use normalize::CaseMode;
    use std::time::Duration as StdDuration;

    fn status_body(earliest: u64, latest: u64) -> String {
        format!(
            r#"{{"result":{{"sync_info":{{"earliest_block_height":"{earliest}","latest_block_height":"{latest}"}}}}}}"#
        )
    }

    fn range_runner(client: RpcClient, sink: Arc<dyn Sink>) -> RangeRunner {
        RangeRunner::new(
            Arc::new(client),
            Arc::new(DecoderPool::new(Arc::new(TypeRegistry::fast_path_only()), 2)),
            sink,
            CaseMode::Snake,
            4,
            StdDuration::from_secs(5),
            1,
            1000,
            15,
        )
    }

    #[tokio::test]
    async fn ingests_then_waits_for_new_heights_until_cancelled() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(status_body(1, 100))
            .create_async()
            .await;
        server
            .mock("GET", "/block")
            .match_query(Matcher::UrlEncoded("height".into(), "100".into()))
            .with_status(200)
            .with_body(
                r#"{"result":{"block_id":{"hash":"H"},"block":{"header":{"chain_id":"c","height":"100","time":"2024-01-01T00:00:00Z","proposer_address":"P","last_commit_hash":"L","data_hash":"D","app_hash":"A"},"data":{"txs":[]},"evidence":{"evidence":[]}}}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/block_results")
            .match_query(Matcher::UrlEncoded("height".into(), "100".into()))
            .with_status(200)
            .with_body(r#"{"result":{"height":"100","txs_results":[]}}"#)
            .create_async()
            .await;

        let client_for_range = RpcClient::new(transport::Transport::new(server.url(), 5000, 1000.0, 2, 10, 0.0));
        let client_for_follow = Arc::new(RpcClient::new(transport::Transport::new(
            server.url(),
            5000,
            1000.0,
            2,
            10,
            0.0,
        )));
        let sink: Arc<dyn Sink> = Arc::new(sink::LineSink::null());

        let range = range_runner(client_for_range, sink.clone());
        let follow = FollowRunner::new(range, client_for_follow, sink, 4, 60_000);

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
            cancel_clone.cancel();
        });

        let result = tokio::time::timeout(StdDuration::from_secs(5), follow.run(100, &cancel)).await;
        assert!(result.is_ok(), "follow loop should return once cancelled");
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn returns_immediately_when_already_cancelled() {
        let server = Server::new_async().await;
        // No mocks registered: if `run` made any RPC call beyond the
        // cancellation check it would fail to connect and surface an error.
        let client = Arc::new(RpcClient::new(transport::Transport::new(
            server.url(),
            100,
            1000.0,
            0,
            1,
            0.0,
        )));
        let sink: Arc<dyn Sink> = Arc::new(sink::LineSink::null());
        let range = range_runner(
            RpcClient::new(transport::Transport::new(server.url(), 100, 1000.0, 0, 1, 0.0)),
            sink.clone(),
        );
        let follow = FollowRunner::new(range, client, sink, 4, 1000);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = follow.run(1, &cancel).await;
        assert!(result.is_ok());
    }
}
