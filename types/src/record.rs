// types/src/record.rs

//! Normalized, in-memory shapes produced midway through the pipeline: a
//! decoded transaction (decoder pool output) and a fully assembled block
//! (block assembler output), which the row extractor then projects into the
//! `RowSet` entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of the decoder pool for a single transaction: `@type` preserved
/// exactly, the rest of the payload case-converted per the configured case
/// mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedTx {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(flatten)]
    pub value: Value,
}

impl DecodedTx {
    /// The opaque fallback used when a tx can't be decoded by either the
    /// fast path or the dynamic registry.
    pub fn opaque(type_url: impl Into<String>, value_b64: impl Into<String>) -> Self {
        DecodedTx {
            type_url: type_url.into(),
            value: serde_json::json!({ "value_b64": value_b64.into() }),
        }
    }

    /// Placeholder emitted when even `TxRaw`/`Tx` parsing fails outright.
    pub fn empty_placeholder(type_url: impl Into<String>) -> Self {
        DecodedTx {
            type_url: type_url.into(),
            value: Value::Object(Default::default()),
        }
    }
}

/// A normalized ABCI event: attributes already base64-decoded where
/// canonical, `index` defaulted to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub event_type: String,
    pub attributes: Vec<NormalizedAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedAttribute {
    pub key: String,
    pub value: String,
    pub index: bool,
}

impl NormalizedEvent {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// One entry of the parsed `raw_log`, or the synthesized tx-level entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// `-1` for the synthesized tx-level entry.
    pub msg_index: i64,
    pub events: Vec<NormalizedEvent>,
}

/// Projection of a `BlockResultsResponse::txs_results[i]` entry plus derived
/// normalized events/logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResponseRecord {
    pub code: u32,
    pub codespace: String,
    pub data: Option<String>,
    pub gas_wanted: String,
    pub gas_used: String,
    pub raw_log: String,
    pub events: Vec<NormalizedEvent>,
    pub logs: Vec<LogEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTxBytes {
    pub base64: String,
    pub hex: String,
}

/// A single assembled transaction within a `BlockRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: String,
    pub raw: RawTxBytes,
    pub decoded: DecodedTx,
    pub tx_response: TxResponseRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMeta {
    pub chain_id: String,
    pub height: u64,
    pub time: DateTime<Utc>,
    /// `block_id.hash`, captured before the raw `block_id` value is
    /// dropped from `BlockRecord::block` (the row extractor still needs it
    /// for `BlockRow::block_hash`).
    pub block_hash: String,
    /// Length of `block.evidence`, captured before the evidence list is
    /// stripped from `BlockRecord::block` to reduce memory.
    pub evidence_count: u32,
    /// Total decoded byte size of every tx in the block, if the block has
    /// any; `None` for an empty block.
    pub size_bytes: Option<u64>,
}

/// Output of the block assembler: `(block, block_results, decoded_txs)`
/// composed into one normalized shape. `block`/`block_results` are
/// the stripped raw responses (evidence and raw tx list dropped) kept around
/// for row extraction steps that still need fields this struct doesn't model
/// explicitly (e.g. `begin_block_events`/`end_block_events`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub meta: BlockMeta,
    pub block: Value,
    pub block_results: Value,
    pub txs: Vec<TxRecord>,
}
