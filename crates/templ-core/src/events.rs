// crates/templ-core/src/events.rs
//
// Records emitted by committed ledger operations.
//
// These are the only outward signal of a state change. The chat-provisioning
// layer watches `MemberJoined`, indexers and bots subscribe to the rest.
// Records are released only after the step that produced them commits.

use serde::Serialize;

use crate::address::{Address, Asset};
use crate::units::{Amount, Timestamp};

/// An outcome record emitted by the ledger.
///
/// Serialize-only: records flow outward to subscribers and are never read
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TemplEvent {
    /// A new member was admitted.
    MemberJoined {
        payer: Address,
        member: Address,
        price: Amount,
        burned: Amount,
        to_treasury: Amount,
        to_member_pool: Amount,
        to_protocol: Amount,
        referrer: Option<Address>,
        referral_paid: Amount,
        join_sequence: u64,
        timestamp: Timestamp,
    },

    MemberPoolClaimed {
        member: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    ExternalRewardClaimed {
        member: Address,
        asset: Asset,
        amount: Amount,
    },

    ProposalCreated {
        id: u64,
        proposer: Address,
        action: String,
        title: String,
        deadline: Timestamp,
        fee_paid: Amount,
    },

    VoteCast {
        id: u64,
        voter: Address,
        support: bool,
        timestamp: Timestamp,
    },

    QuorumReached {
        id: u64,
        at: Timestamp,
        deadline: Timestamp,
    },

    ProposalExecuted {
        id: u64,
        passed: bool,
    },

    TreasuryWithdrawn {
        asset: Asset,
        recipient: Address,
        amount: Amount,
        reason: String,
    },

    TreasuryDisbanded {
        asset: Asset,
        distributed: Amount,
        per_member: Amount,
        members: u64,
    },

    CouncilMemberAdded {
        member: Address,
        added_by: Address,
    },

    CouncilMemberRemoved {
        member: Address,
        removed_by: Address,
    },

    JoinPauseUpdated {
        paused: bool,
    },

    OperatorChanged {
        old: Address,
        new: Address,
    },

    MaxMembersUpdated {
        limit: u64,
    },

    EntryFeeUpdated {
        entry_fee: Amount,
    },

    FeeSplitUpdated {
        burn_bps: u16,
        treasury_bps: u16,
        member_pool_bps: u16,
        protocol_bps: u16,
    },

    HomeLinkUpdated {
        link: String,
    },

    PricingCurveUpdated {
        base_entry_fee: Amount,
    },

    CouncilModeUpdated {
        enabled: bool,
    },

    DictatorshipUpdated {
        enabled: bool,
    },

    BurnAddressUpdated {
        address: Address,
    },

    /// A numeric governance parameter changed (quorum, thresholds, delay, fees).
    GovernanceParamUpdated {
        name: String,
        value: u64,
    },

    /// Announcement produced by the `notice` custom handler.
    Notice {
        proposal_id: Option<u64>,
        message: String,
    },
}
