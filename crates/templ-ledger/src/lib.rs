// crates/templ-ledger/src/lib.rs
//
// templ-ledger: the umbrella Templ ledger.
//
// Ties the economic books and the governance engine together over a token
// bank. Every mutating entry point is one atomic step; see `templ.rs`.
//
// Modules:
// - templ: the `Templ` type, atomic steps, dispatch marker, snapshots
// - membership: joins and reward claims
// - treasury: withdrawals and disband
// - governance: proposals, votes, execution, action handlers
// - api: serializable command/query surface
// - bank: in-memory token bank with a rollback journal
// - config: deploy-time configuration
// - state: persistent ledger state

pub mod api;
pub mod bank;
pub mod config;
pub mod governance;
pub mod membership;
pub mod state;
pub mod templ;
pub mod treasury;

pub use api::{Command, Query, QueryResponse, Response};
pub use bank::InMemoryBank;
pub use config::TemplConfig;
pub use membership::JoinReceipt;
pub use state::{LedgerState, Member, Settings};
pub use templ::{DispatchOrigin, Templ, TemplSnapshot};
pub use treasury::TreasuryInfo;
