// normalize/src/lib.rs

//! Normalization helpers shared by the decoder, assembler, and row
//! extractor: deep case-conversion of decoded message payloads, canonical
//! base64 detection for historical ABCI attribute encoding, `raw_log`
//! parsing, and coin-string parsing.

pub mod base64_attr;
pub mod case;
pub mod coin;
pub mod events;
pub mod log;

pub use base64_attr::{decode_attribute, is_canonical_base64};
pub use case::{deep_convert, CaseMode};
pub use coin::{parse_coin, Coin};
pub use events::{normalize_event, normalize_events};
pub use log::{build_logs, parse_raw_log};
