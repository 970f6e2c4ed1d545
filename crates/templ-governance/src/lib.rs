// crates/templ-governance/src/lib.rs
//
// templ-governance: the closed action set, custom payload handlers, the
// council registry, and the proposal lifecycle engine.
//
// Voting eligibility and action dispatch belong to the ledger. This crate
// decides when a proposal may execute and whether it passed.

pub mod action;
pub mod council;
pub mod engine;
pub mod handlers;
pub mod proposal;

// Re-export key types for ergonomic access from downstream crates.
pub use action::{check_entry_fee, Action};
pub use council::{CouncilRegistry, MIN_COUNCIL_SIZE};
pub use engine::{GovernanceEngine, GovernanceParams, Opened, ProposalDraft, VoteOutcome, VoterStanding};
pub use handlers::{ActionHandler, CustomHandler, HandlerRegistry, NoticeHandler, Resolution};
pub use proposal::{Proposal, ProposalRules, ProposalStatus};
