// crates/templ-ledger/src/treasury.rs
//
// Treasury withdrawals and disband.
//
// The access token's treasury is a book balance inside the ledger account;
// pool funds sit in the same account but are never reachable here. Every
// other asset is held raw in the account, minus whatever has already been
// credited to members and not yet claimed.

use serde::{Deserialize, Serialize};
use tracing::info;

use templ_core::address::{Address, Asset};
use templ_core::error::{StateError, TemplResult, ValidationError};
use templ_core::events::TemplEvent;
use templ_core::traits::TokenBank;
use templ_core::units::Amount;
use templ_governance::action::Action;

use crate::state::FeeTotals;
use crate::templ::Templ;

/// Treasury and pool balances at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryInfo {
    pub treasury_balance: Amount,
    pub member_pool_balance: Amount,
    pub pool_accumulator: Amount,
    pub pool_remainder: Amount,
    pub current_price: Amount,
    pub member_count: u64,
    pub purchase_count: u64,
    pub totals: FeeTotals,
}

impl<B: TokenBank> Templ<B> {
    pub fn treasury_info(&self) -> TreasuryInfo {
        let pool = &self.state.pool;
        TreasuryInfo {
            treasury_balance: self.state.treasury.balance(),
            member_pool_balance: pool.balance(),
            pool_accumulator: pool.accumulator(),
            pool_remainder: pool.remainder(),
            current_price: self.state.current_price(),
            member_count: self.state.member_count(),
            purchase_count: self.state.purchase_count,
            totals: self.state.totals.clone(),
        }
    }

    /// What a withdrawal or disband of `asset` can reach.
    pub fn withdrawable(&self, asset: &Asset) -> Amount {
        if *asset == self.access_asset() {
            return self.state.treasury.balance();
        }
        self.bank
            .balance_of(asset, &self.account())
            .saturating_sub(self.state.external.reserved(asset))
    }

    /// Withdraw directly. Operator only, and only under dictator mode.
    pub fn withdraw_treasury(
        &mut self,
        caller: Address,
        asset: Asset,
        recipient: Address,
        amount: Amount,
        reason: String,
    ) -> TemplResult<()> {
        self.execute_direct(
            caller,
            Action::WithdrawTreasury {
                asset,
                recipient,
                amount,
                reason,
            },
        )
    }

    /// Withdraw everything reachable directly. Operator only, and only
    /// under dictator mode.
    pub fn withdraw_all_treasury(
        &mut self,
        caller: Address,
        asset: Asset,
        recipient: Address,
        reason: String,
    ) -> TemplResult<()> {
        self.execute_direct(
            caller,
            Action::WithdrawAllTreasury {
                asset,
                recipient,
                reason,
            },
        )
    }

    /// Disband directly. Operator only, and only under dictator mode.
    pub fn disband_treasury(&mut self, caller: Address, asset: Asset) -> TemplResult<()> {
        self.execute_direct(caller, Action::DisbandTreasury { asset })
    }

    fn check_asset(&self, asset: &Asset) -> Result<(), ValidationError> {
        if *asset != self.access_asset() && !self.bank.supports(asset) {
            return Err(ValidationError::InvalidCallData(format!(
                "unsupported asset {asset}"
            )));
        }
        Ok(())
    }

    /// Move `amount` of `asset` (everything reachable when `None`) out to
    /// `recipient`.
    pub(crate) fn handle_withdraw(
        &mut self,
        asset: Asset,
        recipient: Address,
        amount: Option<Amount>,
        reason: String,
    ) -> TemplResult<()> {
        self.require_dispatch()?;
        recipient.require_recipient()?;
        self.check_asset(&asset)?;
        let available = self.withdrawable(&asset);
        if available == 0 {
            return Err(StateError::NoTreasuryFunds.into());
        }
        let amount = amount.unwrap_or(available);
        if amount > available {
            return Err(StateError::InsufficientTreasury {
                requested: amount,
                available,
            }
            .into());
        }
        let account = self.account();
        self.bank.transfer(&asset, &account, &recipient, amount)?;
        if asset == self.access_asset() {
            self.state.treasury.withdraw(amount)?;
        }
        self.emit(TemplEvent::TreasuryWithdrawn {
            asset,
            recipient,
            amount,
            reason,
        });
        info!(%asset, %recipient, amount = %amount, "treasury withdrawn");
        Ok(())
    }

    /// Split everything reachable of `asset` evenly across current members.
    /// The integer remainder stays where it was.
    pub(crate) fn handle_disband(&mut self, asset: Asset) -> TemplResult<()> {
        self.require_dispatch()?;
        self.check_asset(&asset)?;
        let balance = self.withdrawable(&asset);
        if balance == 0 {
            return Err(StateError::NoTreasuryFunds.into());
        }
        let members = self.state.member_count();
        if members == 0 {
            return Err(StateError::NoMembers.into());
        }
        let per_member = balance / members as Amount;
        if per_member == 0 {
            return Err(StateError::DistributionTooSmall.into());
        }

        let distributed = if asset == self.access_asset() {
            let credit = self.state.pool.plan_credit(per_member, members)?;
            self.state.treasury.withdraw(credit.retained)?;
            self.state.pool.apply_deposit(credit);
            credit.retained
        } else {
            let credit = self.state.external.plan_credit(
                asset,
                per_member,
                members,
                self.state.purchase_count,
            )?;
            self.state.external.apply_credit(credit);
            credit.total
        };

        self.emit(TemplEvent::TreasuryDisbanded {
            asset,
            distributed,
            per_member,
            members,
        });
        info!(%asset, distributed = %distributed, per_member = %per_member, members, "treasury disbanded");
        Ok(())
    }
}
