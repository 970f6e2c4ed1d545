// crates/templ-governance/src/engine.rs
//
// Proposal table and lifecycle for a Templ.
//
// The engine owns parameters, proposals and the one-active-proposal-per-
// proposer index. It does not know about members, balances or the bank:
// the ledger decides who is eligible, collects the proposal fee, dispatches
// passing actions, and calls back into the engine to record outcomes.
//
// State machine per proposal:
//   Open ──quorum──▶ QuorumMet ──delay──▶ Executable ──execute──▶ Executed
//     └─────────────instant quorum──────────▶┘
// Open proposals whose deadline passes without quorum are Expired.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use templ_core::address::Address;
use templ_core::error::{StateError, TemplResult, ValidationError};
use templ_core::units::{check_bps, Amount, Bps, Timestamp};

use crate::action::{check_len, Action, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};
use crate::proposal::{Proposal, ProposalRules};

pub const DAY: u64 = 24 * 60 * 60;

/// Tunable governance parameters. Snapshotted onto each proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    pub quorum_bps: Bps,
    pub yes_threshold_bps: Bps,
    pub instant_quorum_bps: Bps,
    /// Seconds between first reaching quorum and execution.
    pub post_quorum_delay: u64,
    pub min_voting_period: u64,
    pub max_voting_period: u64,
    /// Used when a proposal asks for period 0.
    pub default_voting_period: u64,
    /// Fee charged to proposers, as bps of the current entry price.
    pub proposal_fee_bps: Bps,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            quorum_bps: 3_300,
            yes_threshold_bps: 5_100,
            instant_quorum_bps: 10_000,
            post_quorum_delay: 36 * 60 * 60,
            min_voting_period: 7 * DAY,
            max_voting_period: 30 * DAY,
            default_voting_period: 7 * DAY,
            proposal_fee_bps: 0,
        }
    }
}

impl GovernanceParams {
    /// # Errors
    /// `InvalidPercentage` for any bps above 10_000, `InvalidVotingPeriod`
    /// if the default period lies outside `[min, max]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_bps("quorum_bps", self.quorum_bps)?;
        check_bps("yes_threshold_bps", self.yes_threshold_bps)?;
        check_bps("instant_quorum_bps", self.instant_quorum_bps)?;
        check_bps("proposal_fee_bps", self.proposal_fee_bps)?;
        if self.min_voting_period > self.max_voting_period
            || self.default_voting_period < self.min_voting_period
            || self.default_voting_period > self.max_voting_period
        {
            return Err(ValidationError::InvalidVotingPeriod {
                period: self.default_voting_period,
                min: self.min_voting_period,
                max: self.max_voting_period,
            });
        }
        Ok(())
    }

    /// Resolve a requested voting period. 0 selects the default.
    pub fn voting_period(&self, requested: u64) -> Result<u64, ValidationError> {
        let period = if requested == 0 {
            self.default_voting_period
        } else {
            requested
        };
        if period < self.min_voting_period || period > self.max_voting_period {
            return Err(ValidationError::InvalidVotingPeriod {
                period,
                min: self.min_voting_period,
                max: self.max_voting_period,
            });
        }
        Ok(period)
    }
}

/// Everything the ledger passes in to open a proposal.
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    pub proposer: Address,
    pub action: Action,
    pub title: String,
    pub description: String,
    /// Requested period in seconds, 0 for the default.
    pub voting_period: u64,
    pub eligible_voters: u64,
    pub join_cutoff: u64,
    pub council_mode: bool,
    pub fee_paid: Amount,
    /// Whether the proposer may vote, and so auto-votes yes.
    pub proposer_votes: bool,
}

/// How the ledger classified a voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterStanding {
    /// General-membership voting; `join_sequence` is checked against the
    /// proposal's cutoff.
    Member { join_sequence: u64 },
    /// Council voting; no join cutoff.
    Council,
}

/// Outcome of opening a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub id: u64,
    pub deadline: Timestamp,
    /// Set when the proposer's own ballot already met quorum.
    pub quorum_reached: Option<Timestamp>,
}

/// Outcome of one ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// `(at, new_deadline)` when this ballot first met quorum.
    pub quorum_reached: Option<(Timestamp, Timestamp)>,
}

/// The governance engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEngine {
    params: GovernanceParams,
    proposals: Vec<Proposal>,
    /// proposer → id of their latest proposal.
    latest_by_proposer: BTreeMap<Address, u64>,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams) -> Self {
        Self {
            params,
            proposals: Vec::new(),
            latest_by_proposer: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    /// Mutable parameters. Only proposals created afterwards see changes.
    pub fn params_mut(&mut self) -> &mut GovernanceParams {
        &mut self.params
    }

    pub fn proposal_count(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        usize::try_from(id).ok().and_then(|i| self.proposals.get(i))
    }

    fn proposal_mut(&mut self, id: u64) -> Result<&mut Proposal, StateError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or(StateError::InvalidProposal { id })
    }

    /// Look up a proposal.
    ///
    /// # Errors
    /// `StateError::InvalidProposal` if `id` is out of range.
    pub fn get(&self, id: u64) -> Result<&Proposal, StateError> {
        self.proposal(id).ok_or(StateError::InvalidProposal { id })
    }

    /// A page of proposals in creation order, and whether more follow.
    pub fn proposals_page(&self, offset: usize, limit: usize) -> (Vec<&Proposal>, bool) {
        let start = offset.min(self.proposals.len());
        let end = start.saturating_add(limit).min(self.proposals.len());
        (
            self.proposals[start..end].iter().collect(),
            end < self.proposals.len(),
        )
    }

    /// The proposer's outstanding proposal, if any.
    pub fn active_proposal_of(&self, proposer: &Address, now: Timestamp) -> Option<u64> {
        self.latest_by_proposer
            .get(proposer)
            .copied()
            .filter(|id| self.proposal(*id).is_some_and(|p| p.is_outstanding(now)))
    }

    /// Check everything `open` would check, without opening.
    ///
    /// # Errors
    /// `ActiveProposalExists`, `InvalidVotingPeriod`, or `TextTooLong`.
    pub fn check_open(
        &self,
        proposer: &Address,
        title: &str,
        description: &str,
        voting_period: u64,
        now: Timestamp,
    ) -> TemplResult<u64> {
        if let Some(proposal_id) = self.active_proposal_of(proposer, now) {
            return Err(StateError::ActiveProposalExists { proposal_id }.into());
        }
        check_len("title", title, MAX_TITLE_LEN)?;
        check_len("description", description, MAX_DESCRIPTION_LEN)?;
        Ok(self.params.voting_period(voting_period)?)
    }

    /// Open a proposal, snapshotting the current parameters onto it.
    pub fn open(&mut self, draft: ProposalDraft, now: Timestamp) -> TemplResult<Opened> {
        let period = self.check_open(
            &draft.proposer,
            &draft.title,
            &draft.description,
            draft.voting_period,
            now,
        )?;
        let id = self.proposal_count();
        let mut proposal = Proposal {
            id,
            proposer: draft.proposer,
            action: draft.action,
            title: draft.title,
            description: draft.description,
            created_at: now,
            deadline: now.saturating_add(period),
            quorum_reached_at: None,
            yes_votes: 0,
            no_votes: 0,
            ballots: BTreeMap::new(),
            rules: ProposalRules {
                quorum_bps: self.params.quorum_bps,
                yes_threshold_bps: self.params.yes_threshold_bps,
                instant_quorum_bps: self.params.instant_quorum_bps,
                post_quorum_delay: self.params.post_quorum_delay,
                eligible_voters: draft.eligible_voters,
                join_cutoff: draft.join_cutoff,
                council_mode: draft.council_mode,
            },
            fee_paid: draft.fee_paid,
            executed: false,
            passed: false,
        };
        let quorum_reached = if draft.proposer_votes {
            proposal
                .record_ballot(draft.proposer, true, now)
                .map(|(at, _)| at)
        } else {
            None
        };
        let deadline = proposal.deadline;
        self.latest_by_proposer.insert(draft.proposer, id);
        self.proposals.push(proposal);
        debug!(id, deadline, "proposal opened");
        Ok(Opened {
            id,
            deadline,
            quorum_reached,
        })
    }

    /// Cast a ballot.
    ///
    /// # Errors
    /// - `InvalidProposal` for an unknown id.
    /// - `AlreadyExecuted` once executed.
    /// - `VotingClosed` at or after the deadline.
    /// - `AlreadyVoted` for a second ballot.
    /// - `JoinedAfterProposal` for a member admitted after creation.
    pub fn vote(
        &mut self,
        id: u64,
        voter: Address,
        support: bool,
        standing: VoterStanding,
        now: Timestamp,
    ) -> Result<VoteOutcome, StateError> {
        let proposal = self.proposal_mut(id)?;
        if proposal.executed {
            return Err(StateError::AlreadyExecuted);
        }
        if now >= proposal.deadline {
            return Err(StateError::VotingClosed);
        }
        if proposal.has_voted(&voter) {
            return Err(StateError::AlreadyVoted);
        }
        if let VoterStanding::Member { join_sequence } = standing {
            if join_sequence > proposal.rules.join_cutoff {
                return Err(StateError::JoinedAfterProposal);
            }
        }
        let quorum_reached = proposal.record_ballot(voter, support, now);
        debug!(id, %voter, support, "ballot recorded");
        Ok(VoteOutcome { quorum_reached })
    }

    /// Decide whether proposal `id` may execute now.
    ///
    /// Returns the action to dispatch when it passes. A proposal that is
    /// executable but fails the yes-vote threshold is finalized here as
    /// `executed = true, passed = false` and `ProposalNotPassed` is returned;
    /// that record is the only state this call changes.
    pub fn prepare_execution(&mut self, id: u64, now: Timestamp) -> Result<Action, StateError> {
        let proposal = self.proposal_mut(id)?;
        if proposal.executed {
            return Err(StateError::AlreadyExecuted);
        }
        proposal.check_timing(now)?;
        if !proposal.passes() {
            proposal.executed = true;
            proposal.passed = false;
            return Err(StateError::ProposalNotPassed);
        }
        Ok(proposal.action.clone())
    }

    /// Record that proposal `id` passed and its action ran.
    pub fn finalize_passed(&mut self, id: u64) -> Result<(), StateError> {
        let proposal = self.proposal_mut(id)?;
        proposal.executed = true;
        proposal.passed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(proposer: &str, eligible: u64) -> ProposalDraft {
        ProposalDraft {
            proposer: Address::from_label(proposer),
            action: Action::SetJoinPaused { paused: true },
            title: "pause".into(),
            description: String::new(),
            voting_period: 0,
            eligible_voters: eligible,
            join_cutoff: eligible,
            council_mode: false,
            fee_paid: 0,
            proposer_votes: true,
        }
    }

    fn member(seq: u64) -> VoterStanding {
        VoterStanding::Member { join_sequence: seq }
    }

    #[test]
    fn test_default_params_validate() {
        let params = GovernanceParams::default();
        params.validate().unwrap();
        assert_eq!(params.voting_period(0).unwrap(), 7 * DAY);
        assert!(params.voting_period(DAY).is_err());
        assert!(params.voting_period(31 * DAY).is_err());
    }

    #[test]
    fn test_proposer_auto_votes_and_one_active() {
        let mut engine = GovernanceEngine::default();
        let opened = engine.open(draft("alice", 5), 100).unwrap();
        let p = engine.get(opened.id).unwrap();
        assert_eq!(p.yes_votes, 1);
        assert!(p.has_voted(&Address::from_label("alice")));
        assert_eq!(
            engine.open(draft("alice", 5), 101),
            Err(StateError::ActiveProposalExists { proposal_id: 0 }.into())
        );
        // A different proposer is fine.
        assert_eq!(engine.open(draft("bob", 5), 101).unwrap().id, 1);
    }

    #[test]
    fn test_expired_proposal_releases_proposer() {
        let mut engine = GovernanceEngine::default();
        // 1 of 5 is below the 33% quorum.
        let opened = engine.open(draft("alice", 5), 0).unwrap();
        assert!(opened.quorum_reached.is_none());
        assert!(engine.open(draft("alice", 5), opened.deadline).is_ok());
    }

    #[test]
    fn test_vote_rules() {
        let mut engine = GovernanceEngine::default();
        let opened = engine.open(draft("alice", 5), 0).unwrap();
        let bob = Address::from_label("bob");
        engine.vote(opened.id, bob, false, member(2), 10).unwrap();
        assert_eq!(
            engine.vote(opened.id, bob, true, member(2), 11),
            Err(StateError::AlreadyVoted)
        );
        assert_eq!(
            engine.vote(opened.id, Address::from_label("late"), true, member(6), 11),
            Err(StateError::JoinedAfterProposal)
        );
        // Council standing skips the cutoff.
        engine
            .vote(opened.id, Address::from_label("late"), true, VoterStanding::Council, 11)
            .unwrap();
        assert_eq!(
            engine.vote(99, bob, true, member(1), 11),
            Err(StateError::InvalidProposal { id: 99 })
        );
    }

    #[test]
    fn test_thresholds_are_snapshotted() {
        let mut engine = GovernanceEngine::default();
        let opened = engine.open(draft("alice", 2), 0).unwrap();
        engine.params_mut().quorum_bps = 10_000;
        engine.params_mut().yes_threshold_bps = 10_000;
        let p = engine.get(opened.id).unwrap();
        assert_eq!(p.rules.quorum_bps, 3_300);
        assert_eq!(p.rules.yes_threshold_bps, 5_100);
        // 1 of 2 met the snapshotted quorum at creation.
        assert_eq!(opened.quorum_reached, Some(0));
    }

    #[test]
    fn test_prepare_execution_paths() {
        let mut engine = GovernanceEngine::default();
        let opened = engine.open(draft("alice", 2), 0).unwrap();
        let delay = engine.params().post_quorum_delay;
        assert_eq!(
            engine.prepare_execution(opened.id, 1),
            Err(StateError::ExecutionDelayActive { ready_at: delay })
        );
        let action = engine.prepare_execution(opened.id, delay).unwrap();
        assert_eq!(action, Action::SetJoinPaused { paused: true });
        engine.finalize_passed(opened.id).unwrap();
        assert_eq!(
            engine.prepare_execution(opened.id, delay),
            Err(StateError::AlreadyExecuted)
        );
    }

    #[test]
    fn test_failed_proposal_is_finalized() {
        let mut engine = GovernanceEngine::default();
        let opened = engine.open(draft("alice", 3), 0).unwrap();
        engine
            .vote(opened.id, Address::from_label("b"), false, member(2), 1)
            .unwrap();
        engine
            .vote(opened.id, Address::from_label("c"), false, member(3), 1)
            .unwrap();
        let deadline = engine.get(opened.id).unwrap().deadline;
        assert_eq!(
            engine.prepare_execution(opened.id, deadline),
            Err(StateError::ProposalNotPassed)
        );
        let p = engine.get(opened.id).unwrap();
        assert!(p.executed);
        assert!(!p.passed);
        assert!(engine.active_proposal_of(&Address::from_label("alice"), deadline).is_none());
    }

    #[test]
    fn test_text_limits() {
        let mut engine = GovernanceEngine::default();
        let mut d = draft("alice", 1);
        d.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            engine.open(d, 0),
            Err(templ_core::TemplError::Validation(ValidationError::TextTooLong {
                field: "title",
                ..
            }))
        ));
        assert_eq!(engine.proposal_count(), 0);
    }
}
