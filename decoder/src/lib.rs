// decoder/src/lib.rs

//! Transaction decoding: a protobuf type registry (fast-path dispatch for a
//! closed set of well-known Cosmos SDK/CosmWasm messages, an optional
//! dynamic registry, and an opaque fallback), whole-transaction decoding via
//! `TxRaw`/`Tx`, and a bounded pool of decoder workers sharing one
//! immutable registry.

pub mod known_types;
pub mod pool;
pub mod registry;
pub mod tx;

pub use pool::{DecoderPool, PoolError};
pub use registry::{DecodeError, TypeRegistry};
pub use tx::decode_tx_bytes;
