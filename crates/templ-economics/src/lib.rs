// crates/templ-economics/src/lib.rs
//
// templ-economics: entry pricing, fee splitting, the member-pool accumulator,
// checkpointed external rewards, and the access-token treasury.
//
// All monetary values are integer token base units. Nothing in this crate
// moves tokens: it computes amounts and keeps the books, and the ledger
// stages the matching transfers against its bank.

pub mod accumulator;
pub mod checkpoint;
pub mod external;
pub mod pricing;
pub mod split;
pub mod treasury;

// Re-export key types for ergonomic access from downstream crates.
pub use accumulator::{MemberPool, PoolAdmission, PoolDeposit};
pub use checkpoint::{Checkpoint, CheckpointIndex, Snapshot, SnapshotWidth};
pub use external::{ExternalClaim, ExternalCredit, ExternalRewardState, ExternalRewards};
pub use pricing::{
    pow_bps, CurveSegment, CurveStyle, PricingCurve, MAX_ENTRY_FEE, MAX_SEGMENTS, MIN_ENTRY_FEE,
};
pub use split::{FeeSplit, SplitAmounts};
pub use treasury::Treasury;
