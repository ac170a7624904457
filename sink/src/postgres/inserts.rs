// sink/src/postgres/inserts.rs

//! Per-table multi-row insert builders. Every insert is split into
//! sub-batches capped by both row count and total parameter count, and
//! carries the conflict policy that makes re-running the same height range
//! idempotent.

use chrono::Utc;
use sqlx::{Postgres, QueryBuilder, Transaction};

use types::{
    BlockRow, EventAttributeRow, EventRow, GovDepositRow, GovProposalRow, GovVoteRow, MessageRow,
    StakeDelegationEventRow, StakeDistributionEventRow, TransactionRow, TransferRow, WasmEventRow,
    WasmExecutionRow,
};

use crate::SinkError;

/// Number of rows per `INSERT ... VALUES` statement, capped by both the
/// caller's row-count threshold and the total-parameter budget.
fn batch_size(max_rows: usize, max_params: usize, columns: usize) -> usize {
    max_rows.min((max_params / columns.max(1)).max(1)).max(1)
}

pub async fn insert_blocks(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[BlockRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 10)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO core.blocks (height, block_hash, time, proposer_address, tx_count, size_bytes, last_commit_hash, data_hash, evidence_count, app_hash) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.block_hash)
                .push_bind(row.time)
                .push_bind(&row.proposer_address)
                .push_bind(row.tx_count as i32)
                .push_bind(row.size_bytes.map(|v| v as i64))
                .push_bind(&row.last_commit_hash)
                .push_bind(&row.data_hash)
                .push_bind(row.evidence_count as i32)
                .push_bind(&row.app_hash);
        });
        qb.push(" ON CONFLICT (height) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_transactions(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[TransactionRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 12)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO core.transactions (height, tx_hash, tx_index, code, gas_wanted, gas_used, fee, memo, signers, raw_tx, log_summary, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.tx_index as i32)
                .push_bind(row.code as i32)
                .push_bind(row.gas_wanted)
                .push_bind(row.gas_used)
                .push_bind(row.fee.clone())
                .push_bind(&row.memo)
                .push_bind(&row.signers)
                .push_bind(row.raw_tx.clone())
                .push_bind(&row.log_summary)
                .push_bind(row.time);
        });
        qb.push(
            " ON CONFLICT (height, tx_hash) DO UPDATE SET gas_used = EXCLUDED.gas_used, log_summary = EXCLUDED.log_summary",
        );
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_messages(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[MessageRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 7)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO core.messages (height, tx_hash, msg_index, type_url, value, signer, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.type_url)
                .push_bind(row.value.clone())
                .push_bind(&row.signer)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (height, tx_hash, msg_index) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_events(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[EventRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 6)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO core.events (height, tx_hash, msg_index, event_index, event_type, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(row.event_index as i32)
                .push_bind(&row.event_type)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (tx_hash, msg_index, event_index) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_event_attrs(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[EventAttributeRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 5)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO core.event_attrs (tx_hash, msg_index, event_index, key, value) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(row.event_index as i32)
                .push_bind(&row.key)
                .push_bind(&row.value);
        });
        qb.push(" ON CONFLICT (tx_hash, msg_index, event_index, key) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_transfers(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[TransferRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 8)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO bank.transfers (height, tx_hash, msg_index, from_addr, to_addr, denom, amount, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.from_addr)
                .push_bind(&row.to_addr)
                .push_bind(&row.denom)
                .push_bind(&row.amount)
                .push_bind(row.time);
        });
        qb.push(
            " ON CONFLICT (height, tx_hash, msg_index, from_addr, to_addr, denom) DO NOTHING",
        );
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_stake_delegation_events(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[StakeDelegationEventRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 10)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO stake.delegation_events (height, tx_hash, msg_index, event_type, delegator_address, validator_src, validator_dst, amount, denom, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.event_type)
                .push_bind(&row.delegator_address)
                .push_bind(&row.validator_src)
                .push_bind(&row.validator_dst)
                .push_bind(&row.amount)
                .push_bind(&row.denom)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (height, tx_hash, msg_index, event_type) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_stake_distribution_events(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[StakeDistributionEventRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 10)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO stake.distribution_events (height, tx_hash, msg_index, event_type, validator_address, delegator_address, amount, denom, withdraw_address, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.event_type)
                .push_bind(&row.validator_address)
                .push_bind(&row.delegator_address)
                .push_bind(&row.amount)
                .push_bind(&row.denom)
                .push_bind(&row.withdraw_address)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (height, tx_hash, msg_index, event_type) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_wasm_executions(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[WasmExecutionRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 8)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO wasm.executions (height, tx_hash, msg_index, contract_address, sender, success, error, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.contract_address)
                .push_bind(&row.sender)
                .push_bind(row.success)
                .push_bind(&row.error)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (height, tx_hash, msg_index) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_wasm_events(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[WasmEventRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 6)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO wasm.events (height, tx_hash, msg_index, event_index, contract_address, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(row.event_index as i32)
                .push_bind(&row.contract_address)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (tx_hash, msg_index, event_index) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_gov_deposits(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[GovDepositRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 8)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO gov.deposits (height, tx_hash, msg_index, proposal_id, depositor, amount, denom, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.proposal_id)
                .push_bind(&row.depositor)
                .push_bind(&row.amount)
                .push_bind(&row.denom)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (tx_hash, msg_index, denom) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_gov_votes(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[GovVoteRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 8)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO gov.votes (height, tx_hash, msg_index, proposal_id, voter, option, weight, time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(row.height as i64)
                .push_bind(&row.tx_hash)
                .push_bind(row.msg_index as i32)
                .push_bind(&row.proposal_id)
                .push_bind(&row.voter)
                .push_bind(&row.option)
                .push_bind(&row.weight)
                .push_bind(row.time);
        });
        qb.push(" ON CONFLICT (tx_hash, msg_index) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

pub async fn insert_gov_proposals(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[GovProposalRow],
    max_rows: usize,
    max_params: usize,
) -> Result<(), SinkError> {
    if rows.is_empty() {
        return Ok(());
    }
    for chunk in rows.chunks(batch_size(max_rows, max_params, 7)) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO gov.proposals (proposal_id, proposer, title, summary, status, submit_height, submit_time) ",
        );
        qb.push_values(chunk.iter(), |mut b, row| {
            b.push_bind(&row.proposal_id)
                .push_bind(&row.proposer)
                .push_bind(&row.title)
                .push_bind(&row.summary)
                .push_bind(&row.status)
                .push_bind(row.submit_height as i64)
                .push_bind(row.submit_time);
        });
        qb.push(
            " ON CONFLICT (proposal_id) DO UPDATE SET \
              proposer = COALESCE(EXCLUDED.proposer, gov.proposals.proposer), \
              title = COALESCE(EXCLUDED.title, gov.proposals.title), \
              summary = COALESCE(EXCLUDED.summary, gov.proposals.summary), \
              status = COALESCE(EXCLUDED.status, gov.proposals.status)",
        );
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

/// Upsert `core.indexer_progress` within the caller's transaction, so the
/// checkpoint advances atomically with the rows it covers.
pub async fn upsert_progress(
    tx: &mut Transaction<'_, Postgres>,
    progress_id: &str,
    last_height: u64,
) -> Result<(), SinkError> {
    sqlx::query(
        "INSERT INTO core.indexer_progress (id, last_height, updated_at) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET last_height = EXCLUDED.last_height, updated_at = EXCLUDED.updated_at \
         WHERE core.indexer_progress.last_height < EXCLUDED.last_height",
    )
    .bind(progress_id)
    .bind(last_height as i64)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::batch_size;

    #[test]
    fn caps_by_row_count_when_params_allow_more() {
        assert_eq!(batch_size(1000, 30_000, 8), 1000);
    }

    #[test]
    fn caps_by_param_budget_when_row_count_allows_more() {
        assert_eq!(batch_size(10_000, 30_000, 10), 3000);
    }

    #[test]
    fn never_returns_zero_for_wide_rows() {
        assert_eq!(batch_size(5, 10, 50), 1);
    }
}
