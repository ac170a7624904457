// rows/src/lib.rs

//! The row extractor: projects an assembled `BlockRecord` into the row sets
//! consumed by the sink, one vector per target table. Pure function, no
//! I/O; the sink is the only consumer that talks to storage.

use normalize::parse_coin;
use serde_json::Value;
use types::record::{BlockRecord, DecodedTx, LogEntry, NormalizedEvent, TxRecord};
use types::{
    BlockRow, EventAttributeRow, EventRow, GovDepositRow, GovProposalRow, GovVoteRow, MessageRow,
    RowSet, StakeDelegationEventRow, StakeDistributionEventRow, TransactionRow, TransferRow,
    WasmEventRow, WasmExecutionRow,
};

/// Fields checked in order when a message's own `signer` can't be read
/// directly.
const SIGNER_FIELDS: &[&str] = &[
    "signer",
    "from_address",
    "delegator_address",
    "validator_address",
    "authority",
    "admin",
    "granter",
    "grantee",
    "sender",
    "creator",
];

/// Project one assembled block into its full row set.
pub fn extract(record: &BlockRecord) -> RowSet {
    let mut rows = RowSet::default();
    rows.blocks.push(build_block_row(record));

    for (tx_index, tx) in record.txs.iter().enumerate() {
        extract_tx(record.meta.height, tx_index as u32, tx, &mut rows);
    }

    rows
}

fn build_block_row(record: &BlockRecord) -> BlockRow {
    let block = &record.block;
    BlockRow {
        height: record.meta.height,
        block_hash: record.meta.block_hash.clone(),
        time: record.meta.time,
        proposer_address: str_field(block, "proposer_address"),
        tx_count: record.txs.len() as u32,
        size_bytes: record.meta.size_bytes,
        last_commit_hash: str_field(block, "last_commit_hash"),
        data_hash: str_field(block, "data_hash"),
        evidence_count: record.meta.evidence_count,
        app_hash: str_field(block, "app_hash"),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get("header")
        .and_then(|h| h.get(key))
        .or_else(|| value.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn extract_tx(height: u64, tx_index: u32, tx: &TxRecord, rows: &mut RowSet) {
    let messages = decoded_messages(&tx.decoded);
    let signers = derive_signers(&tx.decoded, &messages);

    rows.transactions.push(TransactionRow {
        height,
        tx_hash: tx.hash.clone(),
        tx_index,
        code: tx.tx_response.code,
        gas_wanted: tx.tx_response.gas_wanted.parse().unwrap_or(0),
        gas_used: tx.tx_response.gas_used.parse().unwrap_or(0),
        fee: fee_value(&tx.decoded),
        memo: memo_value(&tx.decoded),
        signers,
        raw_tx: serde_json::to_value(&tx.decoded).unwrap_or(Value::Null),
        log_summary: log_summary(tx),
        time: tx.tx_response.timestamp,
    });

    for (msg_index, msg) in messages.iter().enumerate() {
        extract_message(height, tx, msg_index as u32, msg, rows);
    }

    extract_events(height, tx, rows);
}

fn decoded_messages(decoded: &DecodedTx) -> Vec<Value> {
    decoded
        .value
        .get("body")
        .and_then(|b| b.get("messages"))
        .and_then(|m| m.as_array())
        .cloned()
        .unwrap_or_default()
}

fn fee_value(decoded: &DecodedTx) -> Value {
    decoded
        .value
        .get("auth_info")
        .and_then(|a| a.get("fee"))
        .cloned()
        .unwrap_or(Value::Null)
}

fn memo_value(decoded: &DecodedTx) -> String {
    decoded
        .value
        .get("body")
        .and_then(|b| b.get("memo"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// First line of the tx's `raw_log`, or the codespace for a failed tx,
/// kept short enough to serve as a one-line summary column.
fn log_summary(tx: &TxRecord) -> String {
    if tx.tx_response.code != 0 {
        return tx.tx_response.codespace.clone();
    }
    tx.tx_response
        .raw_log
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// The decoded tx's own `signers` field if present (some dynamic-registry
/// decodes surface one), else the first matching address field off each
/// message, filtered to length >= 10 and deduplicated while preserving
/// order.
fn derive_signers(decoded: &DecodedTx, messages: &[Value]) -> Vec<String> {
    if let Some(explicit) = decoded
        .value
        .get("signers")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
    {
        return explicit;
    }

    let mut out = Vec::new();
    for msg in messages {
        if let Some(obj) = msg.as_object() {
            for field in SIGNER_FIELDS {
                if let Some(addr) = obj.get(*field).and_then(|v| v.as_str()) {
                    if addr.len() >= 10 && !out.contains(&addr.to_string()) {
                        out.push(addr.to_string());
                    }
                    break;
                }
            }
        }
    }
    out
}

fn extract_message(height: u64, tx: &TxRecord, msg_index: u32, msg: &Value, rows: &mut RowSet) {
    let type_url = msg
        .get("@type")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let signer = ["signer", "from_address", "delegator_address"]
        .iter()
        .find_map(|f| msg.get(*f).and_then(|v| v.as_str()))
        .map(str::to_string);

    rows.messages.push(MessageRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        type_url: type_url.clone(),
        value: msg.clone(),
        signer,
        time: tx.tx_response.timestamp,
    });

    if type_url == "/cosmwasm.wasm.v1.MsgExecuteContract" {
        extract_wasm_execution(height, tx, msg_index, msg, rows);
    }

    extract_gov_deposit(height, tx, msg_index, &type_url, msg, rows);
    extract_gov_vote(height, tx, msg_index, &type_url, msg, rows);
}

fn extract_wasm_execution(height: u64, tx: &TxRecord, msg_index: u32, msg: &Value, rows: &mut RowSet) {
    let success = tx.tx_response.code == 0;
    rows.wasm_executions.push(WasmExecutionRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        contract_address: str_or_default(msg, "contract"),
        sender: msg.get("sender").and_then(|v| v.as_str()).map(str::to_string),
        success,
        error: if success {
            None
        } else {
            Some(log_summary(tx))
        },
        time: tx.tx_response.timestamp,
    });
}

fn extract_gov_deposit(
    height: u64,
    tx: &TxRecord,
    msg_index: u32,
    type_url: &str,
    msg: &Value,
    rows: &mut RowSet,
) {
    if !matches!(
        type_url,
        "/cosmos.gov.v1beta1.MsgDeposit" | "/cosmos.gov.v1.MsgDeposit"
    ) {
        return;
    }
    let proposal_id = str_or_default(msg, "proposal_id");
    let depositor = str_or_default(msg, "depositor");
    if let Some(coins) = msg.get("amount").and_then(|v| v.as_array()) {
        for coin in coins {
            let amount = str_or_default(coin, "amount");
            let denom = str_or_default(coin, "denom");
            if amount.is_empty() || denom.is_empty() {
                continue;
            }
            rows.gov_deposits.push(GovDepositRow {
                height,
                tx_hash: tx.hash.clone(),
                msg_index,
                proposal_id: proposal_id.clone(),
                depositor: depositor.clone(),
                amount,
                denom,
                time: tx.tx_response.timestamp,
            });
        }
    }
}

fn extract_gov_vote(
    height: u64,
    tx: &TxRecord,
    msg_index: u32,
    type_url: &str,
    msg: &Value,
    rows: &mut RowSet,
) {
    let proposal_id = str_or_default(msg, "proposal_id");
    let voter = str_or_default(msg, "voter");

    match type_url {
        "/cosmos.gov.v1beta1.MsgVote" | "/cosmos.gov.v1.MsgVote" => {
            let option = vote_option_field(msg, "option");
            rows.gov_votes.push(GovVoteRow {
                height,
                tx_hash: tx.hash.clone(),
                msg_index,
                proposal_id,
                voter,
                option,
                weight: None,
                time: tx.tx_response.timestamp,
            });
        }
        "/cosmos.gov.v1beta1.MsgVoteWeighted" | "/cosmos.gov.v1.MsgVoteWeighted" => {
            if let Some(options) = msg.get("options").and_then(|v| v.as_array()) {
                if let Some(first) = options.first() {
                    let option = vote_option_field(first, "option");
                    let weight = first
                        .get("weight")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    rows.gov_votes.push(GovVoteRow {
                        height,
                        tx_hash: tx.hash.clone(),
                        msg_index,
                        proposal_id,
                        voter,
                        option,
                        weight,
                        time: tx.tx_response.timestamp,
                    });
                }
            }
        }
        _ => {}
    }
}

/// The decoded `option` field may be a lowercase string (fast path) or a
/// numeric enum (dynamic registry); normalize both to the lowercase string.
fn vote_option_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|i| vote_option_label(i as i32).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn vote_option_label(option: i32) -> &'static str {
    match option {
        1 => "yes",
        2 => "abstain",
        3 => "no",
        4 => "no_with_veto",
        _ => "unspecified",
    }
}

fn str_or_default(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn extract_events(height: u64, tx: &TxRecord, rows: &mut RowSet) {
    for log in &tx.tx_response.logs {
        extract_log_entry(height, tx, log, rows);
    }
    maybe_extract_gov_proposal(height, tx, rows);
}

fn extract_log_entry(height: u64, tx: &TxRecord, log: &LogEntry, rows: &mut RowSet) {
    for (event_index, event) in log.events.iter().enumerate() {
        let event_index = event_index as u32;
        rows.events.push(EventRow {
            height,
            tx_hash: tx.hash.clone(),
            msg_index: log.msg_index,
            event_index,
            event_type: event.event_type.clone(),
            time: tx.tx_response.timestamp,
        });
        for attr in &event.attributes {
            rows.event_attrs.push(EventAttributeRow {
                tx_hash: tx.hash.clone(),
                msg_index: log.msg_index,
                event_index,
                key: attr.key.clone(),
                value: attr.value.clone(),
            });
        }

        extract_derived_event(height, tx, log.msg_index, event, rows);
    }
}

fn extract_derived_event(
    height: u64,
    tx: &TxRecord,
    msg_index: i64,
    event: &NormalizedEvent,
    rows: &mut RowSet,
) {
    match event.event_type.as_str() {
        "transfer" => extract_transfer(height, tx, msg_index, event, rows),
        "delegate" | "redelegate" | "unbond" | "complete_unbonding" => {
            extract_stake_delegation(height, tx, msg_index, event, rows)
        }
        "withdraw_rewards" | "withdraw_commission" | "set_withdraw_address" => {
            extract_stake_distribution(height, tx, msg_index, event, rows)
        }
        "wasm" => extract_wasm_event(height, tx, msg_index, event, rows),
        _ => {}
    }
}

fn extract_transfer(
    height: u64,
    tx: &TxRecord,
    msg_index: i64,
    event: &NormalizedEvent,
    rows: &mut RowSet,
) {
    let (Some(sender), Some(recipient), Some(amount)) = (
        event.attr("sender"),
        event.attr("recipient"),
        event.attr("amount"),
    ) else {
        return;
    };
    let Some(coin) = parse_coin(amount) else {
        return;
    };
    rows.transfers.push(TransferRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        from_addr: sender.to_string(),
        to_addr: recipient.to_string(),
        denom: coin.denom,
        amount: coin.amount,
        time: tx.tx_response.timestamp,
    });
}

/// Message fields consulted when an event attribute is absent, keyed by
/// event type, for the stake-delegation extraction rule.
fn message_addr(tx: &TxRecord, msg_index: i64, field: &str) -> Option<String> {
    if msg_index < 0 {
        return None;
    }
    decoded_messages(&tx.decoded)
        .get(msg_index as usize)
        .and_then(|m| m.get(field))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn extract_stake_delegation(
    height: u64,
    tx: &TxRecord,
    msg_index: i64,
    event: &NormalizedEvent,
    rows: &mut RowSet,
) {
    let delegator_address = event
        .attr("delegator")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "delegator_address"));

    let validator_src = event
        .attr("source_validator")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "validator_src_address"));
    let validator_dst = event
        .attr("destination_validator")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "validator_dst_address"))
        .or_else(|| {
            if validator_src.is_none() {
                message_addr(tx, msg_index, "validator_address")
            } else {
                None
            }
        });

    let amount_str = event
        .attr("amount")
        .or_else(|| event.attr("completion_amount"));
    let (amount, denom) = match amount_str.and_then(parse_coin) {
        Some(coin) => (Some(coin.amount), Some(coin.denom)),
        None => message_coin(tx, msg_index, "amount"),
    };

    rows.stake_delegation_events.push(StakeDelegationEventRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        event_type: event.event_type.clone(),
        delegator_address,
        validator_src,
        validator_dst,
        amount,
        denom,
        time: tx.tx_response.timestamp,
    });
}

fn message_coin(tx: &TxRecord, msg_index: i64, field: &str) -> (Option<String>, Option<String>) {
    if msg_index < 0 {
        return (None, None);
    }
    let coin = decoded_messages(&tx.decoded)
        .get(msg_index as usize)
        .and_then(|m| m.get(field))
        .cloned();
    match coin {
        Some(Value::Object(obj)) => (
            obj.get("amount").and_then(|v| v.as_str()).map(str::to_string),
            obj.get("denom").and_then(|v| v.as_str()).map(str::to_string),
        ),
        _ => (None, None),
    }
}

fn extract_stake_distribution(
    height: u64,
    tx: &TxRecord,
    msg_index: i64,
    event: &NormalizedEvent,
    rows: &mut RowSet,
) {
    let validator_address = event
        .attr("validator")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "validator_address"));
    let delegator_address = event
        .attr("delegator")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "delegator_address"));
    let withdraw_address = event
        .attr("withdraw_address")
        .map(str::to_string)
        .or_else(|| message_addr(tx, msg_index, "withdraw_address"));

    let (amount, denom) = event
        .attr("amount")
        .and_then(parse_coin)
        .map(|c| (Some(c.amount), Some(c.denom)))
        .unwrap_or((None, None));

    rows.stake_distribution_events.push(StakeDistributionEventRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        event_type: event.event_type.clone(),
        validator_address,
        delegator_address,
        amount,
        denom,
        withdraw_address,
        time: tx.tx_response.timestamp,
    });
}

fn extract_wasm_event(
    height: u64,
    tx: &TxRecord,
    msg_index: i64,
    event: &NormalizedEvent,
    rows: &mut RowSet,
) {
    let Some(contract_address) = event
        .attr("_contract_address")
        .or_else(|| event.attr("contract_address"))
    else {
        return;
    };

    // event_index within this event's own log entry isn't tracked here
    // (the caller already emitted the generic Event row with the real
    // index); recompute it by position within this tx's flattened wasm
    // events for a stable, monotonic ordinal.
    let event_index = rows
        .wasm_events
        .iter()
        .filter(|w| w.tx_hash == tx.hash && w.msg_index == msg_index)
        .count() as u32;

    rows.wasm_events.push(WasmEventRow {
        height,
        tx_hash: tx.hash.clone(),
        msg_index,
        event_index,
        contract_address: contract_address.to_string(),
        time: tx.tx_response.timestamp,
    });
}

/// `MsgSubmitProposal` yields a `GovProposal` row only when a `proposal_id`
/// is extractable from a `submit_proposal` (or `proposal`) event in the same
/// tx.
fn maybe_extract_gov_proposal(height: u64, tx: &TxRecord, rows: &mut RowSet) {
    let messages = decoded_messages(&tx.decoded);
    let submit_indices: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            matches!(
                m.get("@type").and_then(|v| v.as_str()),
                Some("/cosmos.gov.v1beta1.MsgSubmitProposal") | Some("/cosmos.gov.v1.MsgSubmitProposal")
            )
        })
        .map(|(i, _)| i)
        .collect();
    if submit_indices.is_empty() {
        return;
    }

    let proposal_id = tx
        .tx_response
        .events
        .iter()
        .chain(tx.tx_response.logs.iter().flat_map(|l| l.events.iter()))
        .find(|e| matches!(e.event_type.as_str(), "submit_proposal" | "proposal"))
        .and_then(|e| e.attr("proposal_id"));
    let Some(proposal_id) = proposal_id else {
        return;
    };

    for msg_index in submit_indices {
        let msg = &messages[msg_index];
        let proposer = msg.get("proposer").and_then(|v| v.as_str()).map(str::to_string);
        let content = msg.get("content");
        let title = content
            .and_then(|c| c.get("title"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| msg.get("title").and_then(|v| v.as_str()).map(str::to_string));
        let summary = content
            .and_then(|c| c.get("description"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| msg.get("summary").and_then(|v| v.as_str()).map(str::to_string));

        rows.gov_proposals.push(GovProposalRow {
            proposal_id: proposal_id.to_string(),
            proposer,
            title,
            summary,
            status: "deposit_period".to_string(),
            submit_height: height,
            submit_time: tx.tx_response.timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::record::{BlockMeta, NormalizedAttribute, RawTxBytes, TxResponseRecord};

    fn event(kind: &str, attrs: &[(&str, &str)]) -> NormalizedEvent {
        NormalizedEvent {
            event_type: kind.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| NormalizedAttribute {
                    key: k.to_string(),
                    value: v.to_string(),
                    index: true,
                })
                .collect(),
        }
    }

    fn tx_with_logs(hash: &str, code: u32, logs: Vec<LogEntry>, decoded: Value) -> TxRecord {
        TxRecord {
            hash: hash.to_string(),
            raw: RawTxBytes {
                base64: "YQ==".into(),
                hex: "61".into(),
            },
            decoded: DecodedTx {
                type_url: "/cosmos.tx.v1beta1.Tx".into(),
                value: decoded,
            },
            tx_response: TxResponseRecord {
                code,
                codespace: String::new(),
                data: None,
                gas_wanted: "100000".into(),
                gas_used: "54321".into(),
                raw_log: String::new(),
                events: vec![],
                logs,
                timestamp: Utc::now(),
            },
        }
    }

    fn block_record(txs: Vec<TxRecord>) -> BlockRecord {
        BlockRecord {
            meta: BlockMeta {
                chain_id: "test-1".into(),
                height: 100,
                time: Utc::now(),
                block_hash: "HASH".into(),
                evidence_count: 0,
                size_bytes: Some(1),
            },
            block: serde_json::json!({
                "header": {
                    "proposer_address": "PROP",
                    "last_commit_hash": "LC",
                    "data_hash": "DH",
                    "app_hash": "AH",
                }
            }),
            block_results: serde_json::json!({}),
            txs,
        }
    }

    #[test]
    fn extracts_one_row_per_table_for_a_send_with_transfer() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmos.bank.v1beta1.MsgSend",
                    "from_address": "cosmos1sender0000",
                    "to_address": "cosmos1recipient0",
                    "amount": [{"denom": "uatom", "amount": "100"}],
                }],
                "memo": "",
            },
            "auth_info": {"fee": {"amount": [], "gas_limit": "100000"}},
        });
        let logs = vec![LogEntry {
            msg_index: 0,
            events: vec![event(
                "transfer",
                &[
                    ("sender", "cosmos1sender0000"),
                    ("recipient", "cosmos1recipient0"),
                    ("amount", "100uatom"),
                ],
            )],
        }];
        let tx = tx_with_logs("HASH1", 0, logs, decoded);
        let record = block_record(vec![tx]);

        let rows = extract(&record);
        assert_eq!(rows.blocks.len(), 1);
        assert_eq!(rows.blocks[0].block_hash, "HASH");
        assert_eq!(rows.transactions.len(), 1);
        assert_eq!(rows.transactions[0].signers, vec!["cosmos1sender0000"]);
        assert_eq!(rows.messages.len(), 1);
        assert_eq!(rows.events.len(), 1);
        assert_eq!(rows.event_attrs.len(), 3);
        assert_eq!(rows.transfers.len(), 1);
        assert_eq!(rows.transfers[0].amount, "100");
        assert_eq!(rows.transfers[0].denom, "uatom");
    }

    #[test]
    fn transfer_with_malformed_amount_is_skipped() {
        let logs = vec![LogEntry {
            msg_index: -1,
            events: vec![event(
                "transfer",
                &[
                    ("sender", "cosmos1sender0000"),
                    ("recipient", "cosmos1recipient0"),
                    ("amount", "not-a-coin"),
                ],
            )],
        }];
        let tx = tx_with_logs("HASH2", 0, logs, serde_json::json!({"body": {"messages": []}}));
        let rows = extract(&block_record(vec![tx]));
        assert!(rows.transfers.is_empty());
        assert_eq!(rows.events.len(), 1);
    }

    #[test]
    fn wasm_execute_message_emits_execution_row_with_success_flag() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmwasm.wasm.v1.MsgExecuteContract",
                    "sender": "cosmos1sender0000",
                    "contract": "cosmos1contract00",
                }],
            },
        });
        let tx = tx_with_logs("HASH3", 0, vec![], decoded);
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.wasm_executions.len(), 1);
        assert!(rows.wasm_executions[0].success);
        assert!(rows.wasm_executions[0].error.is_none());
    }

    #[test]
    fn failed_wasm_execution_carries_error_summary() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmwasm.wasm.v1.MsgExecuteContract",
                    "sender": "cosmos1sender0000",
                    "contract": "cosmos1contract00",
                }],
            },
        });
        let mut tx = tx_with_logs("HASH4", 5, vec![], decoded);
        tx.tx_response.codespace = "wasm".into();
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.wasm_executions[0].error.as_deref(), Some("wasm"));
    }

    #[test]
    fn gov_vote_weighted_takes_first_option_and_weight() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmos.gov.v1.MsgVoteWeighted",
                    "proposal_id": "7",
                    "voter": "cosmos1voter00000",
                    "options": [{"option": "yes", "weight": "0.5"}, {"option": "no", "weight": "0.5"}],
                }],
            },
        });
        let tx = tx_with_logs("HASH5", 0, vec![], decoded);
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.gov_votes.len(), 1);
        assert_eq!(rows.gov_votes[0].option, "yes");
        assert_eq!(rows.gov_votes[0].weight.as_deref(), Some("0.5"));
    }

    #[test]
    fn gov_deposit_emits_one_row_per_coin() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmos.gov.v1.MsgDeposit",
                    "proposal_id": "7",
                    "depositor": "cosmos1depositor0",
                    "amount": [
                        {"denom": "uatom", "amount": "10"},
                        {"denom": "stake", "amount": "20"},
                    ],
                }],
            },
        });
        let tx = tx_with_logs("HASH6", 0, vec![], decoded);
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.gov_deposits.len(), 2);
    }

    #[test]
    fn stake_delegation_event_falls_back_to_message_fields() {
        let decoded = serde_json::json!({
            "body": {
                "messages": [{
                    "@type": "/cosmos.staking.v1beta1.MsgDelegate",
                    "delegator_address": "cosmos1delegator0",
                    "validator_address": "cosmos1validator0",
                    "amount": {"denom": "uatom", "amount": "500"},
                }],
            },
        });
        let logs = vec![LogEntry {
            msg_index: 0,
            events: vec![event("delegate", &[])],
        }];
        let tx = tx_with_logs("HASH7", 0, logs, decoded);
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.stake_delegation_events.len(), 1);
        let row = &rows.stake_delegation_events[0];
        assert_eq!(row.delegator_address.as_deref(), Some("cosmos1delegator0"));
        assert_eq!(row.validator_dst.as_deref(), Some("cosmos1validator0"));
        assert_eq!(row.amount.as_deref(), Some("500"));
        assert_eq!(row.denom.as_deref(), Some("uatom"));
    }

    #[test]
    fn event_scoped_to_tx_level_uses_msg_index_negative_one() {
        let logs = vec![LogEntry {
            msg_index: -1,
            events: vec![event("coin_spent", &[("spender", "cosmos1x")])],
        }];
        let tx = tx_with_logs("HASH8", 0, logs, serde_json::json!({"body": {"messages": []}}));
        let rows = extract(&block_record(vec![tx]));
        assert_eq!(rows.events[0].msg_index, -1);
    }
}
