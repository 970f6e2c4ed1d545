// crates/templ-ledger/src/membership.rs
//
// Admission and reward claims.
//
// A join pulls the current price from the payer, splits it into burn,
// treasury, member pool and protocol shares, and deposits the pool share
// across the members that existed before the joiner. The joiner's pool debt
// is the accumulator after their own deposit, so nobody earns from their own
// entry fee.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use templ_core::address::{Address, Asset};
use templ_core::error::{StateError, TemplResult};
use templ_core::events::TemplEvent;
use templ_core::traits::TokenBank;
use templ_core::units::{apply_bps, Amount};

use crate::state::Member;
use crate::templ::Templ;

/// What an admission cost and where it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub member: Address,
    pub join_sequence: u64,
    pub price: Amount,
    pub referral_paid: Amount,
}

impl<B: TokenBank> Templ<B> {
    /// Entry price for the next admission.
    pub fn current_price(&self) -> Amount {
        self.state.current_price()
    }

    /// Join as a member, paying the current entry fee.
    ///
    /// # Errors
    /// `JoinPaused`, `AlreadyMember`, `MemberLimitReached`,
    /// `InsufficientBalance`, `InsufficientAllowance`, or `UnsupportedToken`.
    pub fn join(&mut self, caller: Address) -> TemplResult<JoinReceipt> {
        self.atomic("join", |t| t.admit(caller, caller, None))
    }

    /// Pay the entry fee on behalf of `recipient`.
    pub fn join_for(&mut self, payer: Address, recipient: Address) -> TemplResult<JoinReceipt> {
        self.atomic("join_for", |t| t.admit(payer, recipient, None))
    }

    /// Join and credit part of the member-pool share to `referrer`.
    ///
    /// A referrer who is not a member, or is the joiner, is ignored.
    pub fn join_with_referral(
        &mut self,
        caller: Address,
        referrer: Address,
    ) -> TemplResult<JoinReceipt> {
        self.atomic("join_with_referral", |t| {
            t.admit(caller, caller, Some(referrer))
        })
    }

    /// `join_for` with a referrer.
    pub fn join_for_with_referral(
        &mut self,
        payer: Address,
        recipient: Address,
        referrer: Address,
    ) -> TemplResult<JoinReceipt> {
        self.atomic("join_for_with_referral", |t| {
            t.admit(payer, recipient, Some(referrer))
        })
    }

    fn admit(
        &mut self,
        payer: Address,
        recipient: Address,
        referrer: Option<Address>,
    ) -> TemplResult<JoinReceipt> {
        let settings = &self.state.settings;
        if settings.join_paused {
            return Err(StateError::JoinPaused.into());
        }
        recipient.require_recipient()?;
        if self.state.is_member(&recipient) {
            return Err(StateError::AlreadyMember.into());
        }
        let members_before = self.state.member_count();
        if settings.max_members > 0 && members_before >= settings.max_members {
            return Err(StateError::MemberLimitReached.into());
        }

        let account = settings.account;
        let asset = settings.access_asset();
        let burn_address = settings.burn_address;
        let protocol_recipient = settings.protocol_recipient;
        let referral_bps = settings.referral_share_bps;
        let fee_split = settings.fee_split;
        let price = self.state.current_price();
        self.check_payment(&payer, price)?;

        let split = fee_split.split(price).ok_or(StateError::ArithmeticOverflow)?;
        let referrer = referrer.filter(|r| *r != recipient && self.state.is_member(r));
        let referral_paid = match referrer {
            Some(_) => {
                apply_bps(split.member_pool, referral_bps).ok_or(StateError::ArithmeticOverflow)?
            }
            None => 0,
        };
        let pool_share = split.member_pool - referral_paid;
        let join_sequence = self
            .state
            .purchase_count
            .checked_add(1)
            .ok_or(StateError::ArithmeticOverflow)?;
        let admission = self
            .state
            .pool
            .plan_admission(pool_share, members_before, join_sequence)?;
        let treasury_share = split
            .treasury
            .checked_add(admission.deposit.absorbed)
            .ok_or(StateError::ArithmeticOverflow)?;

        self.collect_payment(&payer, price)?;
        if split.burn > 0 {
            self.bank.transfer(&asset, &account, &burn_address, split.burn)?;
        }
        if split.protocol > 0 {
            self.bank
                .transfer(&asset, &account, &protocol_recipient, split.protocol)?;
        }
        if let (Some(to), true) = (referrer, referral_paid > 0) {
            self.bank.transfer(&asset, &account, &to, referral_paid)?;
        }

        let now = self.now();
        let pool_debt = admission.deposit.accumulator;
        let to_member_pool = pool_share - admission.deposit.absorbed;
        self.state.pool.apply_admission(admission);
        self.state.treasury.deposit(treasury_share);
        self.state.members.insert(
            recipient,
            Member {
                join_sequence,
                joined_at: now,
                payer,
                pool_debt,
                external_snapshots: Default::default(),
            },
        );
        self.state.purchase_count = join_sequence;
        let totals = &mut self.state.totals;
        totals.burned = totals.burned.saturating_add(split.burn);
        totals.protocol = totals.protocol.saturating_add(split.protocol);
        totals.referrals = totals.referrals.saturating_add(referral_paid);

        self.emit(TemplEvent::MemberJoined {
            payer,
            member: recipient,
            price,
            burned: split.burn,
            to_treasury: treasury_share,
            to_member_pool,
            to_protocol: split.protocol,
            referrer,
            referral_paid,
            join_sequence,
            timestamp: now,
        });
        info!(
            member = %recipient,
            %payer,
            price = %price,
            join_sequence,
            "member joined"
        );
        Ok(JoinReceipt {
            member: recipient,
            join_sequence,
            price,
            referral_paid,
        })
    }

    /// Member-pool amount `member` could claim now. 0 for non-members.
    pub fn claimable_pool(&self, member: &Address) -> Amount {
        self.state
            .members
            .get(member)
            .map_or(0, |m| self.state.pool.claimable(m.pool_debt))
    }

    /// Pay out the caller's member-pool share.
    ///
    /// # Errors
    /// `NotMember`, or `NoRewardsToClaim` when nothing is owed.
    pub fn claim_member_pool(&mut self, caller: Address) -> TemplResult<Amount> {
        self.atomic("claim_member_pool", |t| {
            let debt = t.require_member(&caller)?.pool_debt;
            let owed = t.state.pool.plan_claim(debt)?;
            let asset = t.access_asset();
            let account = t.account();
            t.bank.transfer(&asset, &account, &caller, owed)?;

            t.state.pool.apply_claim(owed);
            let settled = t.state.pool.accumulator();
            if let Some(member) = t.state.members.get_mut(&caller) {
                member.pool_debt = settled;
            }
            let now = t.now();
            t.emit(TemplEvent::MemberPoolClaimed {
                member: caller,
                amount: owed,
                timestamp: now,
            });
            debug!(member = %caller, amount = %owed, "member pool claimed");
            Ok(owed)
        })
    }

    /// External reward of `asset` that `member` could claim now.
    pub fn claimable_external(&self, member: &Address, asset: &Asset) -> Amount {
        self.state.members.get(member).map_or(0, |m| {
            self.state.external.claimable(
                asset,
                m.external_snapshots.get(asset).copied(),
                m.join_sequence,
            )
        })
    }

    /// Pay out the caller's share of distributions of `asset`.
    ///
    /// # Errors
    /// `NotMember`, or `NoRewardsToClaim` when nothing is owed.
    pub fn claim_external_reward(&mut self, caller: Address, asset: Asset) -> TemplResult<Amount> {
        self.atomic("claim_external_reward", |t| {
            let member = t.require_member(&caller)?;
            let stored = member.external_snapshots.get(&asset).copied();
            let join_sequence = member.join_sequence;
            let claim = t.state.external.plan_claim(asset, stored, join_sequence)?;
            let account = t.account();
            t.bank.transfer(&asset, &account, &caller, claim.amount)?;

            t.state.external.apply_claim(claim);
            if let Some(member) = t.state.members.get_mut(&caller) {
                member.external_snapshots.insert(asset, claim.settle_to);
            }
            t.emit(TemplEvent::ExternalRewardClaimed {
                member: caller,
                asset,
                amount: claim.amount,
            });
            debug!(member = %caller, %asset, amount = %claim.amount, "external reward claimed");
            Ok(claim.amount)
        })
    }

    /// One page of assets that have had distributions, and whether more
    /// follow.
    pub fn external_reward_assets(&self, offset: usize, limit: usize) -> (Vec<Asset>, bool) {
        self.state.external.assets_page(offset, limit)
    }
}
