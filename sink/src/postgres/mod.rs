// sink/src/postgres/mod.rs

//! Postgres-backed sink: the durable store. Supports two write modes
//! selected by `PgConfig::mode` — `block_atomic` commits every assembled
//! block in its own transaction; `batch_insert` buffers rows across blocks
//! and flushes per table once any configured threshold is crossed. Both
//! modes go through the same per-table insert helpers in `inserts`, and
//! both create any missing height partition before writing into it.

mod inserts;
mod partitions;

use async_trait::async_trait;
use config::{PgConfig, PgMode};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use types::RowSet;

use crate::{Sink, SinkError};

/// Row-count ceiling for a single `INSERT ... VALUES (...), (...), ...`
/// statement, independent of the per-table batch thresholds in `PgConfig`
/// (those gate *when* to flush; this gates how the flush is chunked).
const MAX_ROWS_PER_STATEMENT: usize = 5000;
/// Postgres caps bind parameters per statement at 65535; stay well under it.
const MAX_PARAMS_PER_STATEMENT: usize = 32_000;

pub struct PgSink {
    pool: PgPool,
    mode: PgMode,
    progress_id: String,
    cfg: PgConfig,
    buffer: Mutex<RowSet>,
}

impl PgSink {
    pub async fn connect(cfg: &PgConfig) -> Result<Self, SinkError> {
        let ssl_mode = if cfg.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        let options = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database)
            .ssl_mode(ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(cfg.pool_size)
            .connect_with(options)
            .await?;

        Ok(PgSink {
            pool,
            mode: cfg.mode,
            progress_id: cfg.progress_id.clone(),
            cfg: cfg.clone(),
            buffer: Mutex::new(RowSet::default()),
        })
    }

    async fn write_block_atomic(&self, rows: RowSet) -> Result<(), SinkError> {
        let max_height = rows.blocks.iter().map(|b| b.height).max();
        let min_height = rows.blocks.iter().map(|b| b.height).min();

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET LOCAL statement_timeout = '30s'")
            .execute(&mut *tx)
            .await?;
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await?;

        if let (Some(min_h), Some(max_h)) = (min_height, max_height) {
            partitions::ensure_range_partitions(&mut tx, min_h, max_h).await?;
        }
        insert_all(&mut tx, &rows).await?;
        if let Some(height) = max_height {
            inserts::upsert_progress(&mut tx, &self.progress_id, height).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn buffer_and_maybe_flush(&self, rows: RowSet) -> Result<(), SinkError> {
        let mut buf = self.buffer.lock().await;
        buf.extend(rows);

        let over_threshold = buf.blocks.len() >= self.cfg.batch_blocks
            || buf.transactions.len() >= self.cfg.batch_txs
            || buf.messages.len() >= self.cfg.batch_msgs
            || buf.events.len() >= self.cfg.batch_events
            || buf.event_attrs.len() >= self.cfg.batch_attrs;

        if over_threshold {
            let pending = std::mem::take(&mut *buf);
            match self.flush_rows(pending.clone()).await {
                Ok(()) => {}
                Err(err) => {
                    // Leave the buffer intact for a future flush attempt
                    // rather than dropping rows a rolled-back transaction
                    // never committed.
                    buf.extend(pending);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn flush_rows(&self, rows: RowSet) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let max_height = rows.blocks.iter().map(|b| b.height).max();
        let min_height = rows.blocks.iter().map(|b| b.height).min();

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET LOCAL statement_timeout = '30s'")
            .execute(&mut *tx)
            .await?;
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await?;

        if let (Some(min_h), Some(max_h)) = (min_height, max_height) {
            partitions::ensure_range_partitions(&mut tx, min_h, max_h).await?;
        }
        insert_all(&mut tx, &rows).await?;
        if let Some(height) = max_height {
            inserts::upsert_progress(&mut tx, &self.progress_id, height).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

async fn insert_all(tx: &mut Transaction<'_, Postgres>, rows: &RowSet) -> Result<(), SinkError> {
    inserts::insert_blocks(tx, &rows.blocks, MAX_ROWS_PER_STATEMENT, MAX_PARAMS_PER_STATEMENT)
        .await?;
    inserts::insert_transactions(
        tx,
        &rows.transactions,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_messages(tx, &rows.messages, MAX_ROWS_PER_STATEMENT, MAX_PARAMS_PER_STATEMENT)
        .await?;
    inserts::insert_events(tx, &rows.events, MAX_ROWS_PER_STATEMENT, MAX_PARAMS_PER_STATEMENT)
        .await?;
    inserts::insert_event_attrs(
        tx,
        &rows.event_attrs,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_transfers(
        tx,
        &rows.transfers,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_stake_delegation_events(
        tx,
        &rows.stake_delegation_events,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_stake_distribution_events(
        tx,
        &rows.stake_distribution_events,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_wasm_executions(
        tx,
        &rows.wasm_executions,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_wasm_events(
        tx,
        &rows.wasm_events,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_gov_deposits(
        tx,
        &rows.gov_deposits,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    inserts::insert_gov_votes(tx, &rows.gov_votes, MAX_ROWS_PER_STATEMENT, MAX_PARAMS_PER_STATEMENT)
        .await?;
    inserts::insert_gov_proposals(
        tx,
        &rows.gov_proposals,
        MAX_ROWS_PER_STATEMENT,
        MAX_PARAMS_PER_STATEMENT,
    )
    .await?;
    Ok(())
}

#[async_trait]
impl Sink for PgSink {
    async fn write(&self, rows: RowSet) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        match self.mode {
            PgMode::BlockAtomic => self.write_block_atomic(rows).await,
            PgMode::BatchInsert => self.buffer_and_maybe_flush(rows).await,
        }
    }

    async fn flush(&self) -> Result<(), SinkError> {
        let mut buf = self.buffer.lock().await;
        let pending = std::mem::take(&mut *buf);
        match self.flush_rows(pending.clone()).await {
            Ok(()) => Ok(()),
            Err(err) => {
                buf.extend(pending);
                Err(err)
            }
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.flush().await?;
        self.pool.close().await;
        Ok(())
    }

    async fn resume_height(&self) -> Result<Option<u64>, SinkError> {
        let height: Option<i64> =
            sqlx::query_scalar("SELECT last_height FROM core.indexer_progress WHERE id = $1")
                .bind(&self.progress_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(height.map(|h| h as u64))
    }
}
