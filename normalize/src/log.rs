// normalize/src/log.rs

//! Parses a tx's `raw_log` JSON and combines it with the tx-level ABCI
//! events into the `logs` array the block assembler attaches to each tx.

use crate::events::normalize_events;
use tracing::debug;
use types::raw::{AbciEvent, RawLogEntry};
use types::record::LogEntry;

/// `raw_log` is `[ { msg_index, events: [...] }, ... ]`. Parse failure
/// (including an empty string, which many chains emit on success) yields an
/// empty list rather than an error — the caller still has the tx-level
/// events to append.
pub fn parse_raw_log(raw_log: &str) -> Vec<RawLogEntry> {
    if raw_log.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<RawLogEntry>>(raw_log) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(error = %e, "raw_log did not parse as JSON, treating as empty");
            Vec::new()
        }
    }
}

/// Build the full `logs` array: one entry per message parsed from
/// `raw_log`, plus a synthesized tx-level entry (`msg_index = -1`) built
/// from `tx_level_events` appended last.
pub fn build_logs(raw_log: &str, tx_level_events: &[AbciEvent]) -> Vec<LogEntry> {
    let mut logs: Vec<LogEntry> = parse_raw_log(raw_log)
        .into_iter()
        .map(|entry| LogEntry {
            msg_index: entry.msg_index.unwrap_or(-1),
            events: normalize_events(&entry.events),
        })
        .collect();

    logs.push(LogEntry {
        msg_index: -1,
        events: normalize_events(tx_level_events),
    });

    logs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_raw_log() {
        let raw_log = r#"[{"msg_index":0,"events":[{"type":"transfer","attributes":[]}]}]"#;
        let entries = parse_raw_log(raw_log);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msg_index, Some(0));
    }

    #[test]
    fn empty_raw_log_yields_empty_list() {
        assert!(parse_raw_log("").is_empty());
    }

    #[test]
    fn malformed_raw_log_yields_empty_list_not_error() {
        assert!(parse_raw_log("not json").is_empty());
    }

    #[test]
    fn build_logs_appends_tx_level_entry_last() {
        let raw_log = r#"[{"msg_index":0,"events":[]}]"#;
        let tx_events = vec![AbciEvent {
            kind: "tx".into(),
            attributes: vec![],
        }];
        let logs = build_logs(raw_log, &tx_events);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].msg_index, 0);
        assert_eq!(logs[1].msg_index, -1);
        assert_eq!(logs[1].events[0].event_type, "tx");
    }
}
