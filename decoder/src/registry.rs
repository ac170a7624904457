// decoder/src/registry.rs

//! The protobuf type registry: a fast-path dispatch table for a closed set
//! of well-known message types, backed by an optional dynamic registry
//! (loaded from a `FileDescriptorSet` at start-up) and an opaque fallback.
//! Immutable after construction so it can be shared across decoder workers
//! behind an `Arc` without locking.

use base64::{engine::general_purpose::STANDARD, Engine};
use prost::Message;
use prost_reflect::DescriptorPool;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::known_types as kt;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read descriptor set at {0}: {1}")]
    DescriptorRead(String, #[source] std::io::Error),
    #[error("failed to parse descriptor set: {0}")]
    DescriptorParse(#[from] prost_reflect::DescriptorError),
    #[error("failed to decode message: {0}")]
    Prost(#[from] prost::DecodeError),
}

type FastPathFn = fn(&[u8]) -> Option<Value>;

fn decode_known<M>(bytes: &[u8]) -> Option<Value>
where
    M: Message + Default + Serialize,
{
    let msg = M::decode(bytes).ok()?;
    serde_json::to_value(msg).ok()
}

/// Immutable mapping from `type_url` to a typed decoder, plus an optional
/// dynamic registry for types outside the closed fast-path set.
pub struct TypeRegistry {
    fast: HashMap<&'static str, FastPathFn>,
    dynamic: Option<DescriptorPool>,
}

impl TypeRegistry {
    /// Build the registry with only the compiled-in fast path populated; the
    /// dynamic registry is absent, so anything outside the fast-path set
    /// falls back to opaque preservation.
    pub fn fast_path_only() -> Self {
        TypeRegistry {
            fast: build_fast_path(),
            dynamic: None,
        }
    }

    /// Load the dynamic registry from a serialized `FileDescriptorSet` (the
    /// output of `protoc --descriptor_set_out`) in addition to the fast
    /// path, matching the dynamic path populated at start-up from a
    /// protobuf schema tree".
    pub fn load(descriptor_set_path: &Path) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(descriptor_set_path)
            .map_err(|e| DecodeError::DescriptorRead(descriptor_set_path.display().to_string(), e))?;
        let dynamic = DescriptorPool::decode(bytes.as_slice())?;
        Ok(TypeRegistry {
            fast: build_fast_path(),
            dynamic: Some(dynamic),
        })
    }

    /// Decode `bytes` for `type_url` with the three-tier dispatch:
    /// fast path, then dynamic registry, then opaque fallback. The returned
    /// object always carries `@type` (possibly merged over by the fast-path
    /// decoder, which never sets it itself, so it's inserted here).
    pub fn decode(&self, type_url: &str, bytes: &[u8]) -> Value {
        if let Some(decode) = self.fast.get(type_url) {
            if let Some(mut value) = decode(bytes) {
                insert_type(&mut value, type_url);
                return value;
            }
        }
        if let Some(pool) = &self.dynamic {
            let fqn = type_url.trim_start_matches('/');
            if let Some(descriptor) = pool.get_message_by_name(fqn) {
                if let Ok(msg) = prost_reflect::DynamicMessage::decode(descriptor, bytes) {
                    if let Ok(mut value) = serde_json::to_value(&msg) {
                        insert_type(&mut value, type_url);
                        return value;
                    }
                }
            }
        }
        serde_json::json!({
            "@type": type_url,
            "value_b64": STANDARD.encode(bytes),
        })
    }
}

fn insert_type(value: &mut Value, type_url: &str) {
    if let Value::Object(map) = value {
        map.insert("@type".to_string(), Value::String(type_url.to_string()));
    }
}

fn build_fast_path() -> HashMap<&'static str, FastPathFn> {
    let mut m: HashMap<&'static str, FastPathFn> = HashMap::new();
    m.insert("/cosmos.bank.v1beta1.MsgSend", decode_known::<kt::MsgSend>);
    m.insert(
        "/cosmos.staking.v1beta1.MsgDelegate",
        decode_known::<kt::MsgDelegate>,
    );
    m.insert(
        "/cosmos.staking.v1beta1.MsgUndelegate",
        decode_known::<kt::MsgUndelegate>,
    );
    m.insert(
        "/cosmos.staking.v1beta1.MsgBeginRedelegate",
        decode_known::<kt::MsgBeginRedelegate>,
    );
    m.insert(
        "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward",
        decode_known::<kt::MsgWithdrawDelegatorReward>,
    );
    m.insert(
        "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission",
        decode_known::<kt::MsgWithdrawValidatorCommission>,
    );
    m.insert(
        "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress",
        decode_known::<kt::MsgSetWithdrawAddress>,
    );
    m.insert(
        "/cosmwasm.wasm.v1.MsgExecuteContract",
        decode_known::<kt::MsgExecuteContract>,
    );
    m.insert("/cosmos.gov.v1beta1.MsgVote", decode_known::<kt::MsgVote>);
    m.insert("/cosmos.gov.v1.MsgVote", decode_known::<kt::MsgVote>);
    m.insert(
        "/cosmos.gov.v1beta1.MsgVoteWeighted",
        decode_known::<kt::MsgVoteWeighted>,
    );
    m.insert(
        "/cosmos.gov.v1.MsgVoteWeighted",
        decode_known::<kt::MsgVoteWeighted>,
    );
    m.insert(
        "/cosmos.gov.v1beta1.MsgDeposit",
        decode_known::<kt::MsgDeposit>,
    );
    m.insert("/cosmos.gov.v1.MsgDeposit", decode_known::<kt::MsgDeposit>);
    m.insert(
        "/cosmos.gov.v1beta1.MsgSubmitProposal",
        decode_known::<kt::MsgSubmitProposal>,
    );
    m.insert(
        "/cosmos.gov.v1.MsgSubmitProposal",
        decode_known::<kt::MsgSubmitProposal>,
    );
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn fast_path_decodes_known_type_and_sets_at_type() {
        let registry = TypeRegistry::fast_path_only();
        let msg = kt::MsgSend {
            from_address: "cosmos1from".into(),
            to_address: "cosmos1to".into(),
            amount: vec![kt::Coin {
                denom: "uatom".into(),
                amount: "1".into(),
            }],
        };
        let bytes = msg.encode_to_vec();
        let value = registry.decode("/cosmos.bank.v1beta1.MsgSend", &bytes);
        assert_eq!(value["@type"], "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(value["from_address"], "cosmos1from");
    }

    #[test]
    fn unknown_type_without_dynamic_registry_falls_back_to_opaque() {
        let registry = TypeRegistry::fast_path_only();
        let value = registry.decode("/some.unknown.MsgType", b"\x01\x02\x03");
        assert_eq!(value["@type"], "/some.unknown.MsgType");
        assert!(value["value_b64"].is_string());
        assert!(value.get("from_address").is_none());
    }

    #[test]
    fn malformed_bytes_for_known_type_falls_back_to_opaque() {
        let registry = TypeRegistry::fast_path_only();
        // A lone continuation byte is not a valid varint-prefixed field.
        let value = registry.decode("/cosmos.bank.v1beta1.MsgSend", &[0xff]);
        assert!(value["value_b64"].is_string());
    }
}
