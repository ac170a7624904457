// types/tests/basic.rs

use types::{BlockRow, ChainStatus, RowSet};

#[test]
fn chain_status_parses_decimal_strings() {
    let status: ChainStatus = serde_json::from_value(serde_json::json!({
        "sync_info": {
            "earliest_block_height": "5200792",
            "latest_block_height": "6000000"
        }
    }))
    .unwrap();

    assert_eq!(status.earliest_block_height().unwrap(), 5_200_792);
    assert_eq!(status.latest_block_height().unwrap(), 6_000_000);
}

fn block_row(height: u64) -> BlockRow {
    BlockRow {
        height,
        block_hash: "ABCD".into(),
        time: chrono::Utc::now(),
        proposer_address: "proposer".into(),
        tx_count: 0,
        size_bytes: None,
        last_commit_hash: String::new(),
        data_hash: String::new(),
        evidence_count: 0,
        app_hash: String::new(),
    }
}

#[test]
fn row_set_height_range_spans_all_blocks() {
    let mut set = RowSet::default();
    assert!(set.height_range().is_none());

    set.blocks.push(block_row(100));
    set.blocks.push(block_row(102));
    set.blocks.push(block_row(101));

    assert_eq!(set.height_range(), Some((100, 102)));
}

#[test]
fn row_set_extend_concatenates_all_tables() {
    let mut a = RowSet::default();
    a.blocks.push(block_row(1));
    let mut b = RowSet::default();
    b.blocks.push(block_row(2));

    a.extend(b);
    assert_eq!(a.blocks.len(), 2);
    assert!(!a.is_empty());
}
