// assembler/src/lib.rs

//! The block assembler: a pure function composing a raw block, its raw
//! block-results, and the already-decoded transactions aligned by index
//! into one normalized `BlockRecord`.

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use tracing::debug;
use normalize::{build_logs, normalize_events, CaseMode};
use types::raw::{BlockResponse, BlockResultsResponse, TxResult};
use types::record::{BlockMeta, BlockRecord, RawTxBytes, TxRecord, TxResponseRecord};

/// Compose `(block, block_results, decoded_txs)` into a `BlockRecord`.
/// `decoded_txs` must be aligned by index with `block.block.data.txs`; the
/// decoder pool is responsible for producing that alignment (one decode per
/// tx, submitted and awaited in order).
pub fn assemble(
    block: &BlockResponse,
    block_results: &BlockResultsResponse,
    decoded_txs: &[types::record::DecodedTx],
    case_mode: CaseMode,
) -> BlockRecord {
    let header = &block.block.header;
    let raw_txs = &block.block.data.txs;

    let tx_results = pad_tx_results(&block_results.txs_results, raw_txs.len());

    let txs: Vec<TxRecord> = raw_txs
        .iter()
        .zip(decoded_txs.iter())
        .zip(tx_results.iter())
        .map(|((raw_b64, decoded), tx_result)| {
            build_tx_record(raw_b64, decoded.clone(), tx_result, header.time, case_mode)
        })
        .collect();

    let block_hash = block
        .block_id
        .get("hash")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let evidence_count = block
        .block
        .evidence
        .get("evidence")
        .and_then(|v| v.as_array())
        .map(|a| a.len() as u32)
        .unwrap_or(0);
    let size_bytes = if txs.is_empty() {
        None
    } else {
        Some(txs.iter().map(|t| t.raw.base64.len() as u64 * 3 / 4).sum())
    };

    BlockRecord {
        meta: BlockMeta {
            chain_id: header.chain_id.clone(),
            height: header.height.parse().unwrap_or_default(),
            time: header.time,
            block_hash,
            evidence_count,
            size_bytes,
        },
        block: strip_block(block),
        block_results: strip_block_results(block_results),
        txs,
    }
}

/// Pad `txs_results` up to `want_len` with `{ code: 0, events: [] }`
/// placeholders when the node returns fewer results than raw txs — a
/// mismatch some RPC implementations exhibit for pruned/empty blocks.
fn pad_tx_results(tx_results: &[TxResult], want_len: usize) -> Vec<TxResult> {
    if tx_results.len() == want_len {
        return tx_results.to_vec();
    }
    debug!(
        got = tx_results.len(),
        want = want_len,
        "txs_results length mismatch with block.data.txs, padding with placeholders"
    );
    let mut padded = tx_results.to_vec();
    padded.resize_with(want_len, TxResult::empty_placeholder);
    padded
}

fn build_tx_record(
    raw_b64: &str,
    decoded: types::record::DecodedTx,
    tx_result: &TxResult,
    block_time: chrono::DateTime<chrono::Utc>,
    _case_mode: CaseMode,
) -> TxRecord {
    let raw_bytes = STANDARD.decode(raw_b64).unwrap_or_default();
    let hash = hex::encode_upper(Sha256::digest(&raw_bytes));

    let tx_level_events = normalize_events(&tx_result.events);
    let logs = build_logs(&tx_result.log, &tx_result.events);

    TxRecord {
        hash,
        raw: RawTxBytes {
            base64: raw_b64.to_string(),
            hex: hex::encode_upper(&raw_bytes),
        },
        decoded,
        tx_response: TxResponseRecord {
            code: tx_result.code,
            codespace: tx_result.codespace.clone(),
            data: tx_result.data.clone(),
            gas_wanted: tx_result.gas_wanted.clone(),
            gas_used: tx_result.gas_used.clone(),
            raw_log: tx_result.log.clone(),
            events: tx_level_events,
            logs,
            timestamp: block_time,
        },
    }
}

/// Strip the evidence list and raw tx list from the block before keeping it
/// around for row-extraction steps that need fields this crate doesn't
/// model explicitly, reducing memory for the (often large) raw tx payload.
fn strip_block(block: &BlockResponse) -> serde_json::Value {
    let mut value = serde_json::to_value(&block.block).unwrap_or(serde_json::Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("evidence");
        if let Some(data) = obj.get_mut("data").and_then(|d| d.as_object_mut()) {
            data.remove("txs");
        }
    }
    value
}

/// Strip the (already-projected) per-tx results from `block_results`,
/// keeping `begin_block_events`/`end_block_events` for any downstream
/// consumer that needs block-scope (not tx-scope) events.
fn strip_block_results(block_results: &BlockResultsResponse) -> serde_json::Value {
    let mut value = serde_json::to_value(block_results).unwrap_or(serde_json::Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("txs_results");
    }
    value
}
