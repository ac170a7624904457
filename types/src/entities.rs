// types/src/entities.rs

//! Row-shaped entities, one struct per target table. These are produced
//! by the row extractor and consumed by the sink;
//! they carry no behavior of their own beyond what's needed to serialize to
//! SQL parameters or JSON lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRow {
    pub height: u64,
    pub block_hash: String,
    pub time: DateTime<Utc>,
    pub proposer_address: String,
    pub tx_count: u32,
    pub size_bytes: Option<u64>,
    pub last_commit_hash: String,
    pub data_hash: String,
    pub evidence_count: u32,
    pub app_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub height: u64,
    pub tx_hash: String,
    pub tx_index: u32,
    pub code: u32,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub fee: Value,
    pub memo: String,
    pub signers: Vec<String>,
    pub raw_tx: Value,
    pub log_summary: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: u32,
    pub type_url: String,
    pub value: Value,
    pub signer: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub height: u64,
    pub tx_hash: String,
    /// `-1` for tx-scope events (not tied to a message).
    pub msg_index: i64,
    pub event_index: u32,
    pub event_type: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttributeRow {
    pub tx_hash: String,
    pub msg_index: i64,
    pub event_index: u32,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: i64,
    pub from_addr: String,
    pub to_addr: String,
    pub denom: String,
    pub amount: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeDelegationEventRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: i64,
    pub event_type: String,
    pub delegator_address: Option<String>,
    pub validator_src: Option<String>,
    pub validator_dst: Option<String>,
    pub amount: Option<String>,
    pub denom: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeDistributionEventRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: i64,
    pub event_type: String,
    pub validator_address: Option<String>,
    pub delegator_address: Option<String>,
    pub amount: Option<String>,
    pub denom: Option<String>,
    pub withdraw_address: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmExecutionRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: u32,
    pub contract_address: String,
    pub sender: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmEventRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: i64,
    pub event_index: u32,
    pub contract_address: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovDepositRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: u32,
    pub proposal_id: String,
    pub depositor: String,
    pub amount: String,
    pub denom: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovVoteRow {
    pub height: u64,
    pub tx_hash: String,
    pub msg_index: u32,
    pub proposal_id: String,
    pub voter: String,
    pub option: String,
    pub weight: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovProposalRow {
    pub proposal_id: String,
    pub proposer: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub submit_height: u64,
    pub submit_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    pub last_height: u64,
    pub updated_at: DateTime<Utc>,
}

/// The full set of per-block rows produced by the row extractor, one vector
/// per target table. A block with no staking/wasm/gov activity simply leaves
/// the corresponding vectors empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSet {
    pub blocks: Vec<BlockRow>,
    pub transactions: Vec<TransactionRow>,
    pub messages: Vec<MessageRow>,
    pub events: Vec<EventRow>,
    pub event_attrs: Vec<EventAttributeRow>,
    pub transfers: Vec<TransferRow>,
    pub stake_delegation_events: Vec<StakeDelegationEventRow>,
    pub stake_distribution_events: Vec<StakeDistributionEventRow>,
    pub wasm_executions: Vec<WasmExecutionRow>,
    pub wasm_events: Vec<WasmEventRow>,
    pub gov_deposits: Vec<GovDepositRow>,
    pub gov_votes: Vec<GovVoteRow>,
    pub gov_proposals: Vec<GovProposalRow>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.transactions.is_empty()
            && self.messages.is_empty()
            && self.events.is_empty()
            && self.event_attrs.is_empty()
            && self.transfers.is_empty()
            && self.stake_delegation_events.is_empty()
            && self.stake_distribution_events.is_empty()
            && self.wasm_executions.is_empty()
            && self.wasm_events.is_empty()
            && self.gov_deposits.is_empty()
            && self.gov_votes.is_empty()
            && self.gov_proposals.is_empty()
    }

    pub fn extend(&mut self, other: RowSet) {
        self.blocks.extend(other.blocks);
        self.transactions.extend(other.transactions);
        self.messages.extend(other.messages);
        self.events.extend(other.events);
        self.event_attrs.extend(other.event_attrs);
        self.transfers.extend(other.transfers);
        self.stake_delegation_events.extend(other.stake_delegation_events);
        self.stake_distribution_events
            .extend(other.stake_distribution_events);
        self.wasm_executions.extend(other.wasm_executions);
        self.wasm_events.extend(other.wasm_events);
        self.gov_deposits.extend(other.gov_deposits);
        self.gov_votes.extend(other.gov_votes);
        self.gov_proposals.extend(other.gov_proposals);
    }

    /// Min/max height covered by this row set, if any rows are present.
    pub fn height_range(&self) -> Option<(u64, u64)> {
        self.blocks.iter().map(|b| b.height).fold(None, |acc, h| {
            Some(match acc {
                Some((min, max)) => (min.min(h), max.max(h)),
                None => (h, h),
            })
        })
    }
}
