// pipeline/src/lib.rs

//! Wires the ingest engine's crates together into one runnable pipeline:
//! load configuration, build the rate-limited transport and RPC client, the
//! decoder pool and its type registry, the configured sink, then dispatch
//! to the range runner for a closed backfill and, if `follow` is set, the
//! follow runner afterward.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use client::RpcClient;
use config::Config;
use decoder::{DecoderPool, TypeRegistry};
use runner::{case_mode_from_config, resolve_start_height, resolve_to_height, FollowRunner, RangeRunner};
use transport::Transport;

/// Follow-mode's per-poll invocation never uses more than this many
/// in-flight heights, regardless of the configured backfill concurrency —
/// the tip rarely advances by more than a handful of heights between polls.
const FOLLOW_CONCURRENCY_CAP: usize = 16;

/// Run the ingest engine to completion: a closed-range backfill, followed
/// by an unbounded follow loop if `cfg.range.follow` is set. Returns once
/// the backfill (and, if applicable, the follow loop) has been cancelled or
/// has run to normal completion; a skipped height is recorded and logged,
/// never propagated as a pipeline failure.
pub async fn ingest(
    cfg: &Config,
    descriptor_set_path: Option<&Path>,
    cancel: CancellationToken,
) -> Result<()> {
    cfg.validate().context("invalid configuration")?;

    let transport = Transport::new(
        cfg.source.rpc_url.clone(),
        cfg.source.timeout_ms,
        cfg.source.rps,
        cfg.source.retries,
        cfg.source.backoff_ms,
        cfg.source.backoff_jitter,
    );
    let client = Arc::new(RpcClient::new(transport));

    let registry = match descriptor_set_path {
        Some(path) => TypeRegistry::load(path)
            .with_context(|| format!("loading descriptor set at {}", path.display()))?,
        None => TypeRegistry::fast_path_only(),
    };
    let decoder = Arc::new(DecoderPool::new(Arc::new(registry), cfg.concurrency.pool_size));

    let sink = sink::build(cfg).await.context("building sink")?;
    let case_mode = case_mode_from_config(cfg.concurrency.case_mode);

    let from = resolve_start_height(cfg, &*sink, &client)
        .await
        .context("resolving start height")?;
    let to = resolve_to_height(cfg, &client)
        .await
        .context("resolving end height")?;

    let range_runner = RangeRunner::new(
        client.clone(),
        decoder,
        sink.clone(),
        case_mode,
        cfg.concurrency.concurrency,
        std::time::Duration::from_millis(cfg.concurrency.block_timeout_ms),
        cfg.concurrency.max_block_retries,
        cfg.concurrency.progress_every_blocks,
        cfg.concurrency.progress_interval_sec,
    );

    if from <= to {
        info!(from, to, "starting backfill");
        let outcome = range_runner.run(from, to, &cancel).await?;
        info!(
            processed = outcome.processed,
            skipped = outcome.skipped,
            "backfill finished"
        );
    } else {
        info!(from, to, "nothing to backfill, start is already past the requested end");
    }

    if cfg.range.follow && !cancel.is_cancelled() {
        let next = to + 1;
        let follow_concurrency = cfg.concurrency.concurrency.min(FOLLOW_CONCURRENCY_CAP);
        info!(next, "entering follow mode");
        let follow_runner = FollowRunner::new(
            range_runner,
            client,
            sink.clone(),
            follow_concurrency,
            cfg.range.follow_interval_ms,
        );
        follow_runner.run(next, &cancel).await?;
    }

    sink.close().await.context("closing sink")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::SinkKind;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn backfills_a_closed_range_against_a_null_sink() {
        let mut server = Server::new_async().await;
        for h in 100..=101u64 {
            server
                .mock("GET", "/block")
                .match_query(Matcher::UrlEncoded("height".into(), h.to_string()))
                .with_status(200)
                .with_body(format!(
                    r#"{{"result":{{"block_id":{{"hash":"H{h}"}},"block":{{"header":{{"chain_id":"c","height":"{h}","time":"2024-01-01T00:00:00Z","proposer_address":"P","last_commit_hash":"L","data_hash":"D","app_hash":"A"}},"data":{{"txs":[]}},"evidence":{{"evidence":[]}}}}}}}}"#
                ))
                .create_async()
                .await;
            server
                .mock("GET", "/block_results")
                .match_query(Matcher::UrlEncoded("height".into(), h.to_string()))
                .with_status(200)
                .with_body(format!(r#"{{"result":{{"height":"{h}","txs_results":[]}}}}"#))
                .create_async()
                .await;
        }

        let mut cfg = Config::default();
        cfg.source.rpc_url = server.url();
        cfg.range.from = Some(100);
        cfg.range.to = Some(config::ToHeight::Height(101));
        cfg.sink.sink_kind = SinkKind::Null;
        cfg.concurrency.concurrency = 2;
        cfg.concurrency.pool_size = 2;

        let cancel = CancellationToken::new();
        ingest(&cfg, None, cancel).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_invalid_configuration_before_touching_the_network() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "not-a-url".into();
        let err = ingest(&cfg, None, CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
