// assembler/tests/basic.rs

use assembler::assemble;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use normalize::CaseMode;
use types::raw::{
    AbciAttribute, AbciEvent, Block, BlockData, BlockHeader, BlockResponse, BlockResultsResponse,
    TxResult,
};
use types::record::DecodedTx;

fn block_with_one_tx(raw_tx_b64: String) -> BlockResponse {
    BlockResponse {
        block_id: serde_json::json!({"hash": "ABCD"}),
        block: Block {
            header: BlockHeader {
                chain_id: "cosmoshub-4".into(),
                height: "1000".into(),
                time: Utc::now(),
                proposer_address: "PROPOSER".into(),
                last_commit_hash: "LC".into(),
                data_hash: "DH".into(),
                app_hash: "AH".into(),
                extra: serde_json::json!({}),
            },
            data: BlockData {
                txs: vec![raw_tx_b64],
            },
            last_commit: serde_json::json!({}),
            evidence: serde_json::json!({"evidence": []}),
        },
    }
}

fn results_with_one_tx(code: u32) -> BlockResultsResponse {
    BlockResultsResponse {
        height: "1000".into(),
        txs_results: vec![TxResult {
            code,
            codespace: if code == 0 { String::new() } else { "sdk".into() },
            data: None,
            log: r#"[{"msg_index":0,"events":[{"type":"transfer","attributes":[]}]}]"#.into(),
            events: vec![AbciEvent {
                kind: "tx".into(),
                attributes: vec![AbciAttribute {
                    key: "fee".into(),
                    value: "1000uatom".into(),
                    index: Some(true),
                }],
            }],
            gas_wanted: "100000".into(),
            gas_used: "54321".into(),
        }],
        begin_block_events: vec![],
        end_block_events: vec![],
        validator_updates: serde_json::json!([]),
        consensus_param_updates: serde_json::json!({}),
    }
}

#[test]
fn assembles_a_single_tx_block_end_to_end() {
    let raw = STANDARD.encode("a raw protobuf tx");
    let block = block_with_one_tx(raw.clone());
    let results = results_with_one_tx(0);
    let decoded = vec![DecodedTx::opaque("/cosmos.tx.v1beta1.Tx", "irrelevant")];

    let record = assemble(&block, &results, &decoded, CaseMode::Snake);

    assert_eq!(record.meta.height, 1000);
    assert_eq!(record.meta.chain_id, "cosmoshub-4");
    assert_eq!(record.txs.len(), 1);

    let tx = &record.txs[0];
    assert_eq!(tx.raw.base64, raw);
    assert_eq!(tx.tx_response.code, 0);
    assert_eq!(tx.tx_response.gas_used, "54321");
    // one entry from raw_log plus the synthesized tx-level entry
    assert_eq!(tx.tx_response.logs.len(), 2);
    assert_eq!(tx.tx_response.logs[1].msg_index, -1);
}

#[test]
fn nonzero_code_tx_still_assembled_with_codespace() {
    let raw = STANDARD.encode("a failing tx");
    let block = block_with_one_tx(raw);
    let results = results_with_one_tx(5);
    let decoded = vec![DecodedTx::opaque("/cosmos.tx.v1beta1.Tx", "irrelevant")];

    let record = assemble(&block, &results, &decoded, CaseMode::Snake);
    assert_eq!(record.txs[0].tx_response.code, 5);
    assert_eq!(record.txs[0].tx_response.codespace, "sdk");
}

#[test]
fn empty_block_produces_no_tx_records() {
    let block = block_with_one_tx(String::new());
    let mut block = block;
    block.block.data.txs.clear();
    let results = BlockResultsResponse {
        height: "1000".into(),
        txs_results: vec![],
        begin_block_events: vec![],
        end_block_events: vec![],
        validator_updates: serde_json::json!([]),
        consensus_param_updates: serde_json::json!({}),
    };

    let record = assemble(&block, &results, &[], CaseMode::Snake);
    assert!(record.txs.is_empty());
}
