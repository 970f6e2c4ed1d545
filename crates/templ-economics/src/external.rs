// crates/templ-economics/src/external.rs
//
// Per-asset reward distributions for assets other than the access token.
//
// Each asset keeps its own cumulative per-member index, stored as a
// generation-stamped `Snapshot` at the configured width, and its own
// checkpoint log keyed by the purchase counter. A member who has never
// settled an asset starts from the cumulative value at the latest checkpoint
// strictly before their join sequence, so distributions made before they
// joined are never credited to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use templ_core::address::Asset;
use templ_core::error::StateError;
use templ_core::units::Amount;

use crate::checkpoint::{Checkpoint, CheckpointIndex, Snapshot, SnapshotWidth};

/// Distribution state of one external asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRewardState {
    /// Cumulative per-member index.
    pub cumulative: Snapshot,
    /// Credited to members and not yet claimed. Withdrawals cannot touch it.
    pub reserved: Amount,
    /// Total ever credited.
    pub distributed: Amount,
    /// Total ever claimed.
    pub claimed: Amount,
    pub checkpoints: CheckpointIndex,
}

/// A planned credit of `per_member` to every current member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalCredit {
    pub asset: Asset,
    pub per_member: Amount,
    /// `per_member * members`, moved from unreserved into reserved.
    pub total: Amount,
    pub checkpoint: Checkpoint,
}

/// A planned claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalClaim {
    pub asset: Asset,
    pub amount: Amount,
    /// The member's new settlement snapshot.
    pub settle_to: Snapshot,
}

/// All external reward assets, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRewards {
    width: SnapshotWidth,
    assets: BTreeMap<Asset, ExternalRewardState>,
    order: Vec<Asset>,
}

impl ExternalRewards {
    pub fn new(width: SnapshotWidth) -> Self {
        Self {
            width,
            assets: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub fn width(&self) -> SnapshotWidth {
        self.width
    }

    pub fn state(&self, asset: &Asset) -> Option<&ExternalRewardState> {
        self.assets.get(asset)
    }

    /// Funds of `asset` already owed to members.
    pub fn reserved(&self, asset: &Asset) -> Amount {
        self.assets.get(asset).map_or(0, |s| s.reserved)
    }

    /// Current cumulative index of `asset`.
    pub fn cumulative(&self, asset: &Asset) -> Snapshot {
        self.assets.get(asset).map_or(Snapshot::ZERO, |s| s.cumulative)
    }

    /// Plan crediting `per_member` of `asset` to each of `members` members,
    /// checkpointed at `sequence`.
    ///
    /// # Errors
    /// - `StateError::NoMembers` when `members == 0`.
    /// - `StateError::DistributionTooSmall` when `per_member == 0`.
    /// - `StateError::CheckpointOrder` if `sequence` is behind the asset's log.
    /// - `StateError::ArithmeticOverflow` on overflow.
    pub fn plan_credit(
        &self,
        asset: Asset,
        per_member: Amount,
        members: u64,
        sequence: u64,
    ) -> Result<ExternalCredit, StateError> {
        if members == 0 {
            return Err(StateError::NoMembers);
        }
        if per_member == 0 {
            return Err(StateError::DistributionTooSmall);
        }
        let total = per_member
            .checked_mul(members as Amount)
            .ok_or(StateError::ArithmeticOverflow)?;
        let (cumulative, can_record) = match self.assets.get(&asset) {
            Some(state) => (
                state.cumulative.advance(per_member, self.width)?,
                state.checkpoints.can_record(sequence),
            ),
            None => (Snapshot::ZERO.advance(per_member, self.width)?, true),
        };
        if !can_record {
            return Err(StateError::CheckpointOrder);
        }
        if let Some(state) = self.assets.get(&asset) {
            state
                .reserved
                .checked_add(total)
                .ok_or(StateError::ArithmeticOverflow)?;
        }
        Ok(ExternalCredit {
            asset,
            per_member,
            total,
            checkpoint: Checkpoint {
                sequence,
                member_count: members,
                cumulative,
            },
        })
    }

    pub fn apply_credit(&mut self, credit: ExternalCredit) {
        if !self.assets.contains_key(&credit.asset) {
            self.order.push(credit.asset);
        }
        let state = self.assets.entry(credit.asset).or_default();
        state.cumulative = credit.checkpoint.cumulative;
        state.reserved = state.reserved.saturating_add(credit.total);
        state.distributed = state.distributed.saturating_add(credit.total);
        // Sequence order was checked in `plan_credit`.
        state.checkpoints.append(credit.checkpoint);
    }

    /// Baseline for a member who has never settled `asset`.
    pub fn baseline(&self, asset: &Asset, join_sequence: u64) -> Snapshot {
        self.assets
            .get(asset)
            .and_then(|s| s.checkpoints.latest_before(join_sequence))
            .map_or(Snapshot::ZERO, |c| c.cumulative)
    }

    /// What a member is owed in `asset`.
    ///
    /// `stored` is the member's settlement snapshot for this asset, if any.
    pub fn claimable(&self, asset: &Asset, stored: Option<Snapshot>, join_sequence: u64) -> Amount {
        let Some(state) = self.assets.get(asset) else {
            return 0;
        };
        let from = stored.unwrap_or_else(|| self.baseline(asset, join_sequence));
        state.cumulative.accrued_since(&from, self.width)
    }

    /// Plan a claim.
    ///
    /// # Errors
    /// `StateError::NoRewardsToClaim` when nothing is owed.
    pub fn plan_claim(
        &self,
        asset: Asset,
        stored: Option<Snapshot>,
        join_sequence: u64,
    ) -> Result<ExternalClaim, StateError> {
        let amount = self.claimable(&asset, stored, join_sequence);
        if amount == 0 {
            return Err(StateError::NoRewardsToClaim);
        }
        let reserved = self.reserved(&asset);
        if amount > reserved {
            return Err(StateError::InsufficientBalance {
                required: amount,
                available: reserved,
            });
        }
        Ok(ExternalClaim {
            asset,
            amount,
            settle_to: self.cumulative(&asset),
        })
    }

    pub fn apply_claim(&mut self, claim: ExternalClaim) {
        if let Some(state) = self.assets.get_mut(&claim.asset) {
            state.reserved = state.reserved.saturating_sub(claim.amount);
            state.claimed = state.claimed.saturating_add(claim.amount);
        }
    }

    /// One page of assets with reward state, in registration order, and
    /// whether more follow.
    pub fn assets_page(&self, offset: usize, limit: usize) -> (Vec<Asset>, bool) {
        let start = offset.min(self.order.len());
        let end = start.saturating_add(limit).min(self.order.len());
        (self.order[start..end].to_vec(), end < self.order.len())
    }

    pub fn asset_count(&self) -> usize {
        self.order.len()
    }
}
