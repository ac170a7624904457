// runner/src/lib.rs

//! The ingest engine's two orchestrators: `RangeRunner` drives ordered,
//! bounded-concurrency ingestion over a closed height interval, and
//! `FollowRunner` repeatedly invokes it against `[next, tip]` once a
//! backfill catches up. `progress` resolves the `[from, to]` bounds a
//! backfill starts from; both runners share the same fetch → decode →
//! assemble → extract → write pipeline per height.

mod error;
mod follow;
mod progress;
mod range;

pub use error::RunnerError;
pub use follow::FollowRunner;
pub use progress::{case_mode_from_config, resolve_start_height, resolve_to_height};
pub use range::{RangeRunner, RunOutcome};
