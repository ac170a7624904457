// types/src/raw.rs

//! Wire-shaped response DTOs returned by the RPC transport, before any
//! normalization. Fields the core never reads are left as `serde_json::Value`
//! so a response can round-trip without the crate needing to model every
//! corner of the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /status` response body (already unwrapped from `{"result": ...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStatus {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncInfo {
    pub earliest_block_height: String,
    pub latest_block_height: String,
}

impl ChainStatus {
    pub fn earliest_block_height(&self) -> Result<u64, std::num::ParseIntError> {
        self.sync_info.earliest_block_height.parse()
    }

    pub fn latest_block_height(&self) -> Result<u64, std::num::ParseIntError> {
        self.sync_info.latest_block_height.parse()
    }
}

/// `GET /block?height=N` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub block_id: Value,
    pub block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub data: BlockData,
    #[serde(default)]
    pub last_commit: Value,
    #[serde(default)]
    pub evidence: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: String,
    pub time: DateTime<Utc>,
    pub proposer_address: String,
    pub last_commit_hash: String,
    pub data_hash: String,
    pub app_hash: String,
    #[serde(flatten)]
    pub extra: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    #[serde(default)]
    pub txs: Vec<String>,
}

/// `GET /block_results?height=N` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResultsResponse {
    pub height: String,
    #[serde(default)]
    pub txs_results: Vec<TxResult>,
    #[serde(default)]
    pub begin_block_events: Vec<AbciEvent>,
    #[serde(default)]
    pub end_block_events: Vec<AbciEvent>,
    #[serde(default)]
    pub validator_updates: Value,
    #[serde(default)]
    pub consensus_param_updates: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub events: Vec<AbciEvent>,
    #[serde(default)]
    pub gas_wanted: String,
    #[serde(default)]
    pub gas_used: String,
}

impl TxResult {
    /// The placeholder a missing `txs_results` entry is padded with, per the
    /// block assembler's length-mismatch handling.
    pub fn empty_placeholder() -> Self {
        TxResult {
            code: 0,
            codespace: String::new(),
            data: None,
            log: String::new(),
            events: Vec::new(),
            gas_wanted: String::new(),
            gas_used: String::new(),
        }
    }
}

/// A raw ABCI event as it appears on the wire: `type` plus an attribute list
/// whose keys/values may still be base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbciEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<AbciAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbciAttribute {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub index: Option<bool>,
}

/// An entry in a parsed `raw_log` array: `{ msg_index, events }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLogEntry {
    #[serde(default)]
    pub msg_index: Option<i64>,
    #[serde(default)]
    pub events: Vec<AbciEvent>,
}
