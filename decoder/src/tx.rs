// decoder/src/tx.rs

//! Whole-transaction decoding: try `TxRaw` first (body/auth_info
//! kept as separate byte fields so each decodes independently); if the body
//! bytes come back empty, fall back to decoding the whole `Tx` message and
//! re-encoding its `body`/`auth_info` to the shape `TxRaw` would have
//! produced. If both fail, emit an empty-shaped placeholder.

use normalize::{deep_convert, CaseMode};
use prost::Message;
use serde_json::{json, Value};
use tracing::warn;
use types::record::DecodedTx;

use crate::known_types as kt;
use crate::registry::TypeRegistry;

const TX_TYPE_URL: &str = "/cosmos.tx.v1beta1.Tx";

/// Decode one transaction's raw bytes into the normalized
/// `{ "@type": "/cosmos.tx.v1beta1.Tx", body, auth_info, signatures }` shape.
pub fn decode_tx_bytes(bytes: &[u8], registry: &TypeRegistry, case_mode: CaseMode) -> DecodedTx {
    if let Some(decoded) = decode_via_tx_raw(bytes, registry, case_mode) {
        return decoded;
    }
    if let Some(decoded) = decode_via_whole_tx(bytes, registry, case_mode) {
        return decoded;
    }
    warn!(
        prefix_hex = %hex::encode(&bytes[..bytes.len().min(8)]),
        "failed to decode transaction via TxRaw or Tx; emitting empty placeholder"
    );
    DecodedTx::empty_placeholder(TX_TYPE_URL)
}

fn decode_via_tx_raw(bytes: &[u8], registry: &TypeRegistry, case_mode: CaseMode) -> Option<DecodedTx> {
    let raw = kt::TxRaw::decode(bytes).ok()?;
    if raw.body_bytes.is_empty() {
        return None;
    }
    let body = kt::TxBody::decode(raw.body_bytes.as_slice()).ok()?;
    let auth_info = kt::AuthInfo::decode(raw.auth_info_bytes.as_slice()).unwrap_or_default();
    Some(build_decoded_tx(
        &body,
        &auth_info,
        &raw.signatures,
        registry,
        case_mode,
    ))
}

fn decode_via_whole_tx(bytes: &[u8], registry: &TypeRegistry, case_mode: CaseMode) -> Option<DecodedTx> {
    let tx = kt::Tx::decode(bytes).ok()?;
    let body = tx.body?;
    let auth_info = tx.auth_info.unwrap_or_default();
    Some(build_decoded_tx(
        &body,
        &auth_info,
        &tx.signatures,
        registry,
        case_mode,
    ))
}

fn build_decoded_tx(
    body: &kt::TxBody,
    auth_info: &kt::AuthInfo,
    signatures: &[Vec<u8>],
    registry: &TypeRegistry,
    case_mode: CaseMode,
) -> DecodedTx {
    let messages: Vec<Value> = body
        .messages
        .iter()
        .map(|any| decode_message(any, registry, case_mode))
        .collect();

    let body_value = json!({
        "messages": messages,
        "memo": body.memo,
        "timeout_height": body.timeout_height.to_string(),
    });

    let auth_info_value = deep_convert(
        serde_json::to_value(auth_info).unwrap_or(Value::Null),
        case_mode,
    );

    use base64::Engine as _;
    let signatures_value: Vec<Value> = signatures
        .iter()
        .map(|sig| Value::String(base64::engine::general_purpose::STANDARD.encode(sig)))
        .collect();

    DecodedTx {
        type_url: TX_TYPE_URL.to_string(),
        value: json!({
            "body": body_value,
            "auth_info": auth_info_value,
            "signatures": signatures_value,
        }),
    }
}

/// Decode a single `Any` message via the per-message dispatch, with
/// `@type` preserved exactly and all other fields case-converted.
fn decode_message(any: &kt::Any, registry: &TypeRegistry, case_mode: CaseMode) -> Value {
    let decoded = registry.decode(&any.type_url, &any.value);
    deep_convert(decoded, case_mode)
}
