// crates/templ-economics/src/accumulator.rs
//
// Accumulate-per-share ledger for the native member pool.
//
// Depositing `A` while `M` members exist raises the per-member index by
// `A / M`. A member is owed `index - debt`, where `debt` is the index at their
// last settlement. Deposit and claim are O(1) regardless of member count.
//
// Integer division leaves a remainder on each deposit. The remainder is
// carried and added to the next deposit's numerator, so nothing is lost and
// the conservation slack never exceeds one unit per deposit.
//
// Every mutation is split into a `plan_*` step (pure, fallible, checked
// arithmetic) and an `apply_*` step (infallible). Callers stage external
// transfers between the two, so a failed transfer leaves the pool untouched.

use serde::{Deserialize, Serialize};

use templ_core::error::StateError;
use templ_core::units::Amount;

use crate::checkpoint::{Checkpoint, CheckpointIndex, Snapshot, SnapshotWidth};

/// The native member pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPool {
    /// Cumulative per-member index.
    accumulator: Amount,
    /// Undistributed division remainder carried into the next deposit.
    remainder: Amount,
    /// Funds held for members: everything credited and not yet claimed.
    balance: Amount,
    /// Total ever credited to the pool.
    total_deposited: Amount,
    /// Total ever claimed out of the pool.
    total_claimed: Amount,
    /// One checkpoint per admission.
    checkpoints: CheckpointIndex,
}

/// Result of planning a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolDeposit {
    /// Increase of the per-member index.
    pub per_member: Amount,
    /// Index after the deposit.
    pub accumulator: Amount,
    /// Remainder carried after the deposit.
    pub remainder: Amount,
    /// Portion that could not be distributed because there were no members.
    /// The caller routes it elsewhere (the treasury).
    pub absorbed: Amount,
    /// Amount that stays in the pool.
    pub retained: Amount,
}

/// Result of planning an admission: the member-pool deposit plus the
/// checkpoint taken right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAdmission {
    pub deposit: PoolDeposit,
    pub checkpoint: Checkpoint,
}

impl MemberPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> Amount {
        self.accumulator
    }

    pub fn remainder(&self) -> Amount {
        self.remainder
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    pub fn checkpoints(&self) -> &CheckpointIndex {
        &self.checkpoints
    }

    /// Plan depositing `amount` across `members` current members.
    ///
    /// With zero members the whole amount is reported as `absorbed` and the
    /// index does not move.
    ///
    /// # Errors
    /// `StateError::ArithmeticOverflow` if the index would overflow.
    pub fn plan_deposit(&self, amount: Amount, members: u64) -> Result<PoolDeposit, StateError> {
        if members == 0 {
            return Ok(PoolDeposit {
                per_member: 0,
                accumulator: self.accumulator,
                remainder: self.remainder,
                absorbed: amount,
                retained: 0,
            });
        }
        let pending = amount
            .checked_add(self.remainder)
            .ok_or(StateError::ArithmeticOverflow)?;
        let m = members as Amount;
        let per_member = pending / m;
        let accumulator = self
            .accumulator
            .checked_add(per_member)
            .ok_or(StateError::ArithmeticOverflow)?;
        // The carried remainder was already held by the pool.
        Ok(PoolDeposit {
            per_member,
            accumulator,
            remainder: pending % m,
            absorbed: 0,
            retained: amount,
        })
    }

    /// Plan crediting exactly `per_member` to each of `members` members.
    ///
    /// Used by treasury disband, where the caller has already divided the
    /// balance and keeps the remainder at its source.
    pub fn plan_credit(&self, per_member: Amount, members: u64) -> Result<PoolDeposit, StateError> {
        if members == 0 {
            return Err(StateError::NoMembers);
        }
        let retained = per_member
            .checked_mul(members as Amount)
            .ok_or(StateError::ArithmeticOverflow)?;
        let accumulator = self
            .accumulator
            .checked_add(per_member)
            .ok_or(StateError::ArithmeticOverflow)?;
        Ok(PoolDeposit {
            per_member,
            accumulator,
            remainder: self.remainder,
            absorbed: 0,
            retained,
        })
    }

    /// Plan an admission: deposit the pool share across the members that
    /// existed before the joiner, then checkpoint at `sequence` with the
    /// post-admission member count.
    pub fn plan_admission(
        &self,
        pool_share: Amount,
        members_before: u64,
        sequence: u64,
    ) -> Result<PoolAdmission, StateError> {
        if !self.checkpoints.can_record(sequence) {
            return Err(StateError::CheckpointOrder);
        }
        let deposit = self.plan_deposit(pool_share, members_before)?;
        let member_count = members_before
            .checked_add(1)
            .ok_or(StateError::ArithmeticOverflow)?;
        Ok(PoolAdmission {
            deposit,
            checkpoint: Checkpoint {
                sequence,
                member_count,
                cumulative: Snapshot::from_raw(deposit.accumulator, SnapshotWidth::DEFAULT),
            },
        })
    }

    pub fn apply_deposit(&mut self, deposit: PoolDeposit) {
        self.accumulator = deposit.accumulator;
        self.remainder = deposit.remainder;
        self.balance = self.balance.saturating_add(deposit.retained);
        self.total_deposited = self.total_deposited.saturating_add(deposit.retained);
    }

    pub fn apply_admission(&mut self, admission: PoolAdmission) {
        self.apply_deposit(admission.deposit);
        // Sequence order was checked in `plan_admission`.
        self.checkpoints.append(admission.checkpoint);
    }

    /// What a member with settlement snapshot `debt` is owed.
    pub fn claimable(&self, debt: Amount) -> Amount {
        self.accumulator.saturating_sub(debt)
    }

    /// Plan a claim for a member with settlement snapshot `debt`.
    ///
    /// # Errors
    /// `StateError::NoRewardsToClaim` when nothing is owed.
    pub fn plan_claim(&self, debt: Amount) -> Result<Amount, StateError> {
        let owed = self.claimable(debt);
        if owed == 0 {
            return Err(StateError::NoRewardsToClaim);
        }
        if owed > self.balance {
            return Err(StateError::InsufficientBalance {
                required: owed,
                available: self.balance,
            });
        }
        Ok(owed)
    }

    /// Record a paid-out claim. The member's new debt is `accumulator()`.
    pub fn apply_claim(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_sub(amount);
        self.total_claimed = self.total_claimed.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admit(pool: &mut MemberPool, share: Amount, members_before: u64) -> PoolAdmission {
        let plan = pool
            .plan_admission(share, members_before, members_before + 1)
            .unwrap();
        pool.apply_admission(plan);
        plan
    }

    #[test]
    fn test_first_member_earns_nothing_from_own_payment() {
        let mut pool = MemberPool::new();
        let plan = admit(&mut pool, 30, 0);
        assert_eq!(plan.deposit.absorbed, 30);
        assert_eq!(pool.accumulator(), 0);
        assert_eq!(pool.balance(), 0);
        assert_eq!(pool.claimable(0), 0);
    }

    #[test]
    fn test_three_member_progression() {
        let mut pool = MemberPool::new();
        admit(&mut pool, 30, 0);
        let debt1 = 0;
        admit(&mut pool, 30, 1);
        let debt2 = pool.accumulator();
        assert_eq!(pool.claimable(debt1), 30);
        admit(&mut pool, 30, 2);
        let debt3 = pool.accumulator();
        assert_eq!(pool.claimable(debt1), 45);
        assert_eq!(pool.claimable(debt2), 15);
        assert_eq!(pool.claimable(debt3), 0);
        assert_eq!(pool.checkpoints().len(), 3);
        assert_eq!(pool.checkpoints().last().unwrap().member_count, 3);
    }

    #[test]
    fn test_remainder_is_carried() {
        let mut pool = MemberPool::new();
        let d = pool.plan_deposit(10, 3).unwrap();
        assert_eq!(d.per_member, 3);
        assert_eq!(d.remainder, 1);
        pool.apply_deposit(d);
        let d = pool.plan_deposit(2, 3).unwrap();
        assert_eq!(d.per_member, 1);
        assert_eq!(d.remainder, 0);
        pool.apply_deposit(d);
        assert_eq!(pool.accumulator(), 4);
        assert_eq!(pool.balance(), 12);
    }

    #[test]
    fn test_claim_settles_to_zero() {
        let mut pool = MemberPool::new();
        pool.apply_deposit(pool.plan_deposit(90, 3).unwrap());
        let owed = pool.plan_claim(0).unwrap();
        assert_eq!(owed, 30);
        pool.apply_claim(owed);
        let debt = pool.accumulator();
        assert_eq!(pool.plan_claim(debt), Err(StateError::NoRewardsToClaim));
        assert_eq!(pool.balance(), 60);
        assert_eq!(pool.total_claimed(), 30);
    }

    #[test]
    fn test_conservation_across_deposits() {
        let mut pool = MemberPool::new();
        let mut debts = Vec::new();
        let mut deposited = 0;
        for (i, share) in [7u128, 13, 29, 31, 5].iter().enumerate() {
            let plan = admit(&mut pool, *share, i as u64);
            deposited += plan.deposit.retained;
            debts.push(pool.accumulator());
        }
        // First member's debt is 0.
        debts[0] = 0;
        let owed: Amount = debts.iter().map(|d| pool.claimable(*d)).sum();
        // 78 deposited, 75 owed, 3 still carried.
        assert_eq!(deposited, 78);
        assert_eq!(owed, 75);
        assert_eq!(deposited - owed, pool.remainder());
    }

    #[test]
    fn test_plan_credit_requires_members() {
        let pool = MemberPool::new();
        assert_eq!(pool.plan_credit(5, 0), Err(StateError::NoMembers));
        let d = pool.plan_credit(5, 4).unwrap();
        assert_eq!(d.retained, 20);
        assert_eq!(d.accumulator, 5);
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let pool = MemberPool::new();
        let _ = pool.plan_deposit(100, 2).unwrap();
        assert_eq!(pool, MemberPool::new());
    }
}
