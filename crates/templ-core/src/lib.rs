// crates/templ-core/src/lib.rs
//
// templ-core: Core types, traits, and error taxonomy for the Templ ledger.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines addresses and assets, monetary units, the discriminated error
// families, the emitted record types, and the seams (token bank, clock)
// through which the ledger touches the outside world.

pub mod address;
pub mod clock;
pub mod error;
pub mod events;
pub mod traits;
pub mod units;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use templ_core::Address;`

pub use address::{Address, Asset};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    AuthorizationError, BankError, StateError, TemplError, TemplResult, ValidationError,
};
pub use events::TemplEvent;
pub use traits::TokenBank;
pub use units::{Amount, Bps, Timestamp, BPS_DENOMINATOR};
