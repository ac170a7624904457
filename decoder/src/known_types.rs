// decoder/src/known_types.rs

//! Hand-written `prost::Message` definitions for the closed set of
//! well-known Cosmos SDK / CosmWasm message types the fast path decodes
//! without going through the dynamic registry. Field tags mirror the public
//! `cosmos-sdk`/`wasmd` `.proto` definitions; fields the row extractor never
//! reads are omitted (protobuf decoding silently skips unknown wire fields,
//! so omitting a trailing field like `MsgVote`'s `metadata` is safe).

use serde::Serialize;

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

// --- cosmos.bank.v1beta1 ---------------------------------------------------

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

// --- cosmos.staking.v1beta1 ------------------------------------------------

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgDelegate {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgUndelegate {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgBeginRedelegate {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_src_address: String,
    #[prost(string, tag = "3")]
    pub validator_dst_address: String,
    #[prost(message, optional, tag = "4")]
    pub amount: Option<Coin>,
}

// --- cosmos.distribution.v1beta1 ------------------------------------------

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgWithdrawDelegatorReward {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgWithdrawValidatorCommission {
    #[prost(string, tag = "1")]
    pub validator_address: String,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgSetWithdrawAddress {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub withdraw_address: String,
}

// --- cosmwasm.wasm.v1 ------------------------------------------------------

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgExecuteContract {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub contract: String,
    #[prost(bytes = "vec", tag = "3")]
    pub msg: Vec<u8>,
    #[prost(message, repeated, tag = "5")]
    pub funds: Vec<Coin>,
}

// --- cosmos.gov.v1beta1 / cosmos.gov.v1 -----------------------------------
//
// The v1 variants add a trailing `metadata` string field (tag 4/5) that
// these structs don't declare; unknown fields are skipped by the decoder,
// so the same struct services both message versions for the fields the row
// extractor actually reads.

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgVote {
    #[prost(uint64, tag = "1")]
    pub proposal_id: u64,
    #[prost(string, tag = "2")]
    pub voter: String,
    #[prost(int32, tag = "3")]
    pub option: i32,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct WeightedVoteOption {
    #[prost(int32, tag = "1")]
    pub option: i32,
    #[prost(string, tag = "2")]
    pub weight: String,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgVoteWeighted {
    #[prost(uint64, tag = "1")]
    pub proposal_id: u64,
    #[prost(string, tag = "2")]
    pub voter: String,
    #[prost(message, repeated, tag = "3")]
    pub options: Vec<WeightedVoteOption>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgDeposit {
    #[prost(uint64, tag = "1")]
    pub proposal_id: u64,
    #[prost(string, tag = "2")]
    pub depositor: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgSubmitProposal {
    #[prost(message, optional, tag = "1")]
    pub content: Option<Any>,
    #[prost(message, repeated, tag = "2")]
    pub initial_deposit: Vec<Coin>,
    #[prost(string, tag = "3")]
    pub proposer: String,
}

/// Resolves a gov `VoteOption` int to the lowercase string the row
/// extractor and sink expect.
pub fn vote_option_str(option: i32) -> &'static str {
    match option {
        1 => "yes",
        2 => "abstain",
        3 => "no",
        4 => "no_with_veto",
        _ => "unspecified",
    }
}

// --- cosmos.tx.v1beta1 -----------------------------------------------------

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(int64, tag = "3")]
    pub timeout_height: i64,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Tx {
    #[prost(message, optional, tag = "1")]
    pub body: Option<TxBody>,
    #[prost(message, optional, tag = "2")]
    pub auth_info: Option<AuthInfo>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn coin_round_trips_through_the_wire() {
        let coin = Coin {
            denom: "uatom".into(),
            amount: "123".into(),
        };
        let bytes = coin.encode_to_vec();
        let decoded = Coin::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, coin);
    }

    #[test]
    fn msg_send_round_trips_with_repeated_coin() {
        let msg = MsgSend {
            from_address: "cosmos1from".into(),
            to_address: "cosmos1to".into(),
            amount: vec![Coin {
                denom: "uatom".into(),
                amount: "100".into(),
            }],
        };
        let bytes = msg.encode_to_vec();
        let decoded = MsgSend::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn unknown_trailing_fields_are_skipped_not_rejected() {
        // Simulates a v1 MsgVote with a trailing metadata string (tag 4) that
        // MsgVote doesn't declare.
        #[derive(Clone, PartialEq, ::prost::Message)]
        struct MsgVoteV1 {
            #[prost(uint64, tag = "1")]
            proposal_id: u64,
            #[prost(string, tag = "2")]
            voter: String,
            #[prost(int32, tag = "3")]
            option: i32,
            #[prost(string, tag = "4")]
            metadata: String,
        }
        let v1 = MsgVoteV1 {
            proposal_id: 7,
            voter: "cosmos1voter".into(),
            option: 1,
            metadata: "ipfs://...".into(),
        };
        let bytes = v1.encode_to_vec();
        let decoded = MsgVote::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.proposal_id, 7);
        assert_eq!(decoded.voter, "cosmos1voter");
        assert_eq!(decoded.option, 1);
    }

    #[test]
    fn vote_option_str_maps_known_values() {
        assert_eq!(vote_option_str(1), "yes");
        assert_eq!(vote_option_str(4), "no_with_veto");
        assert_eq!(vote_option_str(99), "unspecified");
    }
}
