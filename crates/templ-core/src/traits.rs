// crates/templ-core/src/traits.rs

use crate::address::{Address, Asset};
use crate::error::BankError;
use crate::units::Amount;

/// Trait for the token ledger the Templ settles against.
///
/// Implemented by `templ_ledger::InMemoryBank`; a chain adapter would
/// implement it over real token contracts. Every ledger entry point runs
/// inside one `begin` .. `commit`/`rollback` bracket, so staged transfers
/// only become final once the ledger's own bookkeeping has been applied.
pub trait TokenBank {
    /// Whether the bank knows this asset at all.
    fn supports(&self, asset: &Asset) -> bool;

    /// Balance of `owner` in `asset`. Unknown assets report zero.
    fn balance_of(&self, asset: &Asset, owner: &Address) -> Amount;

    /// Amount `spender` may pull from `owner` via `transfer_from`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` of `asset` from `from` to `to`.
    fn transfer(
        &mut self,
        asset: &Asset,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError>;

    /// Pull `amount` of `token` from `from` to `to` on behalf of `spender`,
    /// consuming allowance.
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError>;

    /// Open a transaction. Nested calls are not supported.
    fn begin(&mut self);

    /// Make every transfer since `begin` final.
    fn commit(&mut self);

    /// Undo every transfer since `begin`.
    fn rollback(&mut self);
}
