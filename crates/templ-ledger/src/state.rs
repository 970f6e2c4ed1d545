// crates/templ-ledger/src/state.rs
//
// Persistent state of a Templ: settings, the member table, the economic
// books, the council, and the proposal table. Everything here serializes, so
// a whole ledger can be snapshotted and restored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use templ_core::address::{Address, Asset};
use templ_core::units::{flexible_amount, Amount, Bps, Timestamp};
use templ_economics::accumulator::MemberPool;
use templ_economics::checkpoint::Snapshot;
use templ_economics::external::ExternalRewards;
use templ_economics::pricing::PricingCurve;
use templ_economics::split::FeeSplit;
use templ_economics::treasury::Treasury;
use templ_governance::council::CouncilRegistry;
use templ_governance::engine::GovernanceEngine;

use crate::config::TemplConfig;

/// A member record. Created on admission, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Admission number, starting at 1.
    pub join_sequence: u64,
    pub joined_at: Timestamp,
    /// Who paid the entry fee (differs from the member for `join_for`).
    pub payer: Address,
    /// Member-pool accumulator at the last settlement.
    pub pool_debt: Amount,
    /// Per-asset external settlement snapshots. Absent until first claim.
    #[serde(default)]
    pub external_snapshots: BTreeMap<Asset, Snapshot>,
}

/// Mutable ledger settings that governance handlers change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub operator: Address,
    pub account: Address,
    pub protocol_recipient: Address,
    pub access_token: Address,
    /// Price at `price_anchor`.
    #[serde(with = "flexible_amount")]
    pub base_entry_fee: Amount,
    /// Purchase count at which the curve was last anchored.
    pub price_anchor: u64,
    pub pricing_curve: PricingCurve,
    pub fee_split: FeeSplit,
    pub max_members: u64,
    pub join_paused: bool,
    pub dictator_mode: bool,
    pub council_mode: bool,
    pub burn_address: Address,
    pub home_link: String,
    pub referral_share_bps: Bps,
}

impl Settings {
    pub fn access_asset(&self) -> Asset {
        Asset::Token(self.access_token)
    }
}

/// Running totals of entry-fee flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTotals {
    pub burned: Amount,
    pub protocol: Amount,
    pub referrals: Amount,
    pub proposal_fees: Amount,
}

/// The whole ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub settings: Settings,
    pub members: BTreeMap<Address, Member>,
    /// Admissions ever made. Drives the pricing curve and checkpoint keys.
    pub purchase_count: u64,
    pub pool: MemberPool,
    pub external: ExternalRewards,
    pub treasury: Treasury,
    pub totals: FeeTotals,
    pub council: CouncilRegistry,
    pub governance: GovernanceEngine,
}

impl LedgerState {
    /// Fresh state from a validated config.
    pub fn from_config(config: &TemplConfig) -> Self {
        Self {
            settings: Settings {
                operator: config.operator,
                account: config.account,
                protocol_recipient: config.protocol_recipient,
                access_token: config.access_token,
                base_entry_fee: config.base_entry_fee,
                price_anchor: 0,
                pricing_curve: config.pricing_curve.clone(),
                fee_split: config.fee_split,
                max_members: config.max_members,
                join_paused: config.join_paused,
                dictator_mode: config.dictator_mode,
                council_mode: config.council_mode,
                burn_address: config.burn_address,
                home_link: config.home_link.clone(),
                referral_share_bps: config.referral_share_bps,
            },
            members: BTreeMap::new(),
            purchase_count: 0,
            pool: MemberPool::new(),
            external: ExternalRewards::new(config.external_snapshot_width),
            treasury: Treasury::new(),
            totals: FeeTotals::default(),
            council: CouncilRegistry::new(config.initial_council.iter().copied()),
            governance: GovernanceEngine::new(config.governance),
        }
    }

    pub fn member_count(&self) -> u64 {
        self.members.len() as u64
    }

    pub fn is_member(&self, addr: &Address) -> bool {
        self.members.contains_key(addr)
    }

    /// Entry price for the next admission.
    pub fn current_price(&self) -> Amount {
        let steps = self
            .purchase_count
            .saturating_sub(self.settings.price_anchor);
        self.settings
            .pricing_curve
            .price_at(self.settings.base_entry_fee, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_seeds_council_and_params() {
        let config = TemplConfig {
            initial_council: vec![Address::from_label("a"), Address::from_label("b")],
            ..TemplConfig::default()
        };
        let state = LedgerState::from_config(&config);
        assert_eq!(state.council.len(), 2);
        assert_eq!(state.member_count(), 0);
        assert_eq!(state.current_price(), 100);
        assert_eq!(state.governance.params().quorum_bps, 3_300);
    }

    #[test]
    fn test_price_follows_anchor() {
        let config = TemplConfig {
            pricing_curve: PricingCurve::linear(1_000),
            base_entry_fee: 1_000,
            ..TemplConfig::default()
        };
        let mut state = LedgerState::from_config(&config);
        state.purchase_count = 3;
        assert_eq!(state.current_price(), 1_300);
        state.settings.base_entry_fee = 500;
        state.settings.price_anchor = 3;
        assert_eq!(state.current_price(), 500);
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut state = LedgerState::from_config(&TemplConfig::default());
        state.members.insert(
            Address::from_label("m"),
            Member {
                join_sequence: 1,
                joined_at: 10,
                payer: Address::from_label("m"),
                pool_debt: 0,
                external_snapshots: BTreeMap::from([(Asset::Native, Snapshot::ZERO)]),
            },
        );
        let json = serde_json::to_string(&state).unwrap();
        let back: LedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
